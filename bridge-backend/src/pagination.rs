// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Offset pagination over bridge events.

use crate::models::{EventFilter, EventType};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    ZeroPage,
    #[error("items per page must be greater than zero")]
    ZeroPageSize,
}

/// Page cursor. `next_page`/`prev_page` do not check against the total; the
/// caller consults `has_next_page`/`has_previous_page` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32, // 1-based
    items_per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, items_per_page: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::ZeroPage);
        }
        if items_per_page == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            page,
            items_per_page,
        })
    }

    pub fn first_page(items_per_page: u32) -> Result<Self, PaginationError> {
        Self::new(1, items_per_page)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn skip(&self) -> u32 {
        (self.page - 1).saturating_mul(self.items_per_page)
    }

    pub fn total_pages(&self, count: u64) -> u64 {
        count.div_ceil(u64::from(self.items_per_page))
    }

    pub fn has_next_page(&self, count: u64) -> bool {
        u64::from(self.page) < self.total_pages(count)
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Must run on every filter change, before the next fetch.
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    pub fn page_info(&self, count: u64) -> PageInfo {
        PageInfo {
            current_page: self.page,
            has_next_page: self.has_next_page(count),
            has_previous_page: self.has_previous_page(),
            total_items: count,
            total_pages: self.total_pages(count),
        }
    }
}

/// Pagination summary returned with every page of events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Everything needed to fetch one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub pagination: Pagination,
    pub filter: EventFilter,
}

impl PageQuery {
    pub fn new(
        page: u32,
        items_per_page: u32,
        event_type: EventType,
        chain_name: Option<String>,
    ) -> Result<Self, PaginationError> {
        Ok(Self {
            pagination: Pagination::new(page, items_per_page)?,
            filter: EventFilter::new(event_type, chain_name),
        })
    }

    pub fn skip(&self) -> u32 {
        self.pagination.skip()
    }

    pub fn first(&self) -> u32 {
        self.pagination.items_per_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_page_of_45() {
        let pagination = Pagination::new(2, 20).unwrap();
        assert_eq!(pagination.skip(), 20);
        assert_eq!(pagination.total_pages(45), 3);
        assert!(pagination.has_next_page(45));
        assert!(pagination.has_previous_page());
    }

    #[test]
    fn test_total_pages_boundaries() {
        let pagination = Pagination::first_page(20).unwrap();
        assert_eq!(pagination.total_pages(0), 0);
        assert_eq!(pagination.total_pages(1), 1);
        assert_eq!(pagination.total_pages(20), 1);
        assert_eq!(pagination.total_pages(21), 2);
        assert!(!pagination.has_next_page(0));
        assert!(!pagination.has_next_page(20));
        assert!(pagination.has_next_page(21));
        assert!(!pagination.has_previous_page());
    }

    #[test]
    fn test_has_next_matches_total_pages() {
        for items_per_page in 1..=7u32 {
            for count in 0..=50u64 {
                for page in 1..=10u32 {
                    let p = Pagination::new(page, items_per_page).unwrap();
                    let expected_pages = (count + u64::from(items_per_page) - 1) / u64::from(items_per_page);
                    assert_eq!(p.total_pages(count), expected_pages);
                    assert_eq!(p.has_next_page(count), u64::from(page) < expected_pages);
                }
            }
        }
    }

    #[test]
    fn test_transitions() {
        let mut pagination = Pagination::first_page(10).unwrap();
        pagination.next_page();
        pagination.next_page();
        assert_eq!(pagination.page(), 3);
        assert_eq!(pagination.skip(), 20);

        pagination.prev_page();
        assert_eq!(pagination.page(), 2);

        pagination.reset_page();
        assert_eq!(pagination.page(), 1);

        pagination.prev_page();
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn test_rejects_zero() {
        assert_eq!(Pagination::new(0, 20), Err(PaginationError::ZeroPage));
        assert_eq!(Pagination::new(1, 0), Err(PaginationError::ZeroPageSize));
        assert!(PageQuery::new(0, 20, EventType::Withdraw, None).is_err());
    }

    #[test]
    fn test_page_query_offsets() {
        let query = PageQuery::new(4, 25, EventType::Deposit, Some("tcg".into())).unwrap();
        assert_eq!(query.skip(), 75);
        assert_eq!(query.first(), 25);
        assert_eq!(query.filter.chain_name(), Some("tcg"));
    }

    #[test]
    fn test_page_info() {
        let info = Pagination::new(3, 20).unwrap().page_info(45);
        assert_eq!(
            info,
            PageInfo {
                current_page: 3,
                has_next_page: false,
                has_previous_page: true,
                total_items: 45,
                total_pages: 3,
            }
        );
    }
}
