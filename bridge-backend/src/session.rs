// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Stateful view over one filtered set of bridge events.
//!
//! A session owns the current filter, the page cursor and two result slots
//! (current page, totals). Each refresh takes a generation ticket before it
//! awaits anything and commits only if no newer refresh or filter change has
//! happened since, so a slow older response never overwrites a newer one.

use crate::aggregate::{BatchScanAggregator, EventAggregator};
use crate::error::IndexerError;
use crate::indexer::BridgeEventSource;
use crate::models::{AggregateResult, BridgeEvent, EventFilter, EventType};
use crate::pagination::{PageInfo, Pagination, PaginationError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// ============================================================================
// RESULT SLOTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// One fetched page of events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsPage {
    pub items: Vec<BridgeEvent>,
    pub info: PageInfo,
}

impl LoadState<EventsPage> {
    /// Current items, empty unless a page is loaded.
    pub fn items(&self) -> &[BridgeEvent] {
        self.ready().map(|page| page.items.as_slice()).unwrap_or(&[])
    }
}

impl LoadState<AggregateResult> {
    /// Current totals, zero unless loaded.
    pub fn totals(&self) -> AggregateResult {
        self.ready().cloned().unwrap_or_default()
    }
}

/// Ticket proving which request generation a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Result slot that only accepts results from its latest generation
#[derive(Debug)]
pub struct LatestSlot<T> {
    inner: Mutex<SlotInner<T>>,
}

#[derive(Debug)]
struct SlotInner<T> {
    generation: u64,
    state: LoadState<T>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                generation: 0,
                state: LoadState::Loading,
            }),
        }
    }

    /// Start a new generation; every older ticket becomes stale.
    pub fn begin(&self) -> Ticket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = LoadState::Loading;
        Ticket(inner.generation)
    }

    /// Apply a result if its ticket is still current. Returns whether it was applied.
    pub fn commit(&self, ticket: Ticket, state: LoadState<T>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.0 {
            return false;
        }
        inner.state = state;
        true
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.inner.lock().generation == ticket.0
    }

    pub fn snapshot(&self) -> LoadState<T> {
        self.inner.lock().state.clone()
    }
}

impl<T: Clone> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SESSION
// ============================================================================

struct Cursor {
    filter: EventFilter,
    pagination: Pagination,
    last_count: Option<u64>,
}

pub struct EventsSession<S: ?Sized> {
    source: Arc<S>,
    aggregator: Arc<dyn EventAggregator>,
    cursor: Mutex<Cursor>,
    page: LatestSlot<EventsPage>,
    stats: LatestSlot<AggregateResult>,
    stats_cancel: Mutex<CancellationToken>,
}

impl<S: BridgeEventSource + 'static> EventsSession<S> {
    /// Session backed by the client-side batch scan for totals.
    pub fn new(
        source: Arc<S>,
        filter: EventFilter,
        items_per_page: u32,
        batch_size: u32,
    ) -> Result<Self, PaginationError> {
        let aggregator = Arc::new(BatchScanAggregator::new(source.clone(), batch_size));
        Self::with_aggregator(source, aggregator, filter, items_per_page)
    }
}

impl<S: BridgeEventSource + ?Sized> EventsSession<S> {
    pub fn with_aggregator(
        source: Arc<S>,
        aggregator: Arc<dyn EventAggregator>,
        filter: EventFilter,
        items_per_page: u32,
    ) -> Result<Self, PaginationError> {
        Ok(Self {
            source,
            aggregator,
            cursor: Mutex::new(Cursor {
                filter,
                pagination: Pagination::first_page(items_per_page)?,
                last_count: None,
            }),
            page: LatestSlot::new(),
            stats: LatestSlot::new(),
            stats_cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn filter(&self) -> EventFilter {
        self.cursor.lock().filter.clone()
    }

    pub fn current_page(&self) -> u32 {
        self.cursor.lock().pagination.page()
    }

    pub fn page_state(&self) -> LoadState<EventsPage> {
        self.page.snapshot()
    }

    pub fn stats_state(&self) -> LoadState<AggregateResult> {
        self.stats.snapshot()
    }

    /// Change the filter. Resets to page 1, cancels any running aggregation
    /// and invalidates in-flight refreshes. Returns false if nothing changed.
    pub fn set_filter(&self, event_type: EventType, chain_name: Option<String>) -> bool {
        let filter = EventFilter::new(event_type, chain_name);
        {
            let mut cursor = self.cursor.lock();
            if cursor.filter == filter {
                return false;
            }
            cursor.filter = filter;
            cursor.pagination.reset_page();
            cursor.last_count = None;
        }

        self.stats_cancel.lock().cancel();
        self.page.begin();
        self.stats.begin();
        debug!("Session: filter changed, page reset to 1");
        true
    }

    /// Advance one page if the last loaded page says there is one.
    pub fn next_page(&self) -> bool {
        let mut cursor = self.cursor.lock();
        match cursor.last_count {
            Some(count) if cursor.pagination.has_next_page(count) => {
                cursor.pagination.next_page();
                true
            }
            _ => false,
        }
    }

    pub fn prev_page(&self) -> bool {
        let mut cursor = self.cursor.lock();
        if !cursor.pagination.has_previous_page() {
            return false;
        }
        cursor.pagination.prev_page();
        true
    }

    /// Fetch the total and the current page. A failure clears the page.
    pub async fn refresh_page(&self) -> Result<(), IndexerError> {
        let ticket = self.page.begin();
        let (filter, pagination) = {
            let cursor = self.cursor.lock();
            (cursor.filter.clone(), cursor.pagination)
        };

        let result = self.load_page(&filter, pagination).await;

        match result {
            Ok(page) => {
                let count = page.info.total_items;
                if self.page.commit(ticket, LoadState::Ready(page)) {
                    let mut cursor = self.cursor.lock();
                    if cursor.filter == filter {
                        cursor.last_count = Some(count);
                    }
                } else {
                    debug!("Session: discarded stale page {}", pagination.page());
                }
                Ok(())
            }
            Err(e) => {
                warn!("Session: failed to load bridge events: {}", e);
                self.page.commit(ticket, LoadState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Recompute totals for the current filter. Cancelled scans commit nothing.
    pub async fn refresh_stats(&self) -> Result<(), IndexerError> {
        let ticket = self.stats.begin();
        let cancel = {
            let mut current = self.stats_cancel.lock();
            current.cancel();
            *current = CancellationToken::new();
            current.clone()
        };
        let filter = self.filter();

        match self.aggregator.aggregate(&filter, &cancel).await {
            Ok(totals) => {
                if !self.stats.commit(ticket, LoadState::Ready(totals)) {
                    debug!("Session: discarded stale totals");
                }
                Ok(())
            }
            Err(IndexerError::Cancelled) => {
                debug!("Session: aggregation cancelled");
                Err(IndexerError::Cancelled)
            }
            Err(e) => {
                warn!("Session: failed to aggregate bridge events: {}", e);
                self.stats.commit(ticket, LoadState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_page(
        &self,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> Result<EventsPage, IndexerError> {
        let count = self.source.fetch_count(filter).await?.len() as u64;
        let items = self
            .source
            .fetch_page(filter, pagination.items_per_page(), pagination.skip())
            .await?;

        Ok(EventsPage {
            items,
            info: pagination.page_info(count),
        })
    }
}
