// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Count and sum over every event matching a filter.
//!
//! The indexer has no aggregate operator, so totals come from scanning raw
//! `{amount, id}` rows batch by batch. Batches run strictly in order: each
//! offset depends on the previous batch's length, and a short or empty batch
//! ends the scan.

use crate::amount::Amount;
use crate::error::IndexerError;
use crate::indexer::BridgeEventSource;
use crate::models::{AggregateResult, EventFilter};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Anything that can produce totals for a filter
#[async_trait]
pub trait EventAggregator: Send + Sync {
    async fn aggregate(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, IndexerError>;
}

/// Totals derived client-side by a full sequential scan
pub struct BatchScanAggregator<S: ?Sized> {
    source: Arc<S>,
    batch_size: u32,
}

impl<S: BridgeEventSource + ?Sized> BatchScanAggregator<S> {
    pub fn new(source: Arc<S>, batch_size: u32) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }
}

#[async_trait]
impl<S: BridgeEventSource + ?Sized> EventAggregator for BatchScanAggregator<S> {
    async fn aggregate(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, IndexerError> {
        let mut count: u64 = 0;
        let mut sum = Amount::zero();
        let mut skip: u32 = 0;
        let mut batches: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(IndexerError::Cancelled);
            }

            let batch = tokio::select! {
                _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
                batch = self.source.fetch_amounts(filter, self.batch_size, skip) => batch?,
            };
            batches += 1;

            for row in &batch {
                let amount: Amount = row.amount.parse().map_err(|e| {
                    IndexerError::MalformedResponse(format!(
                        "event {} has invalid amount '{}': {}",
                        row.id, row.amount, e
                    ))
                })?;
                sum += &amount;
            }
            count += batch.len() as u64;

            debug!(
                "Aggregate: batch {} returned {} rows (skip={})",
                batches,
                batch.len(),
                skip
            );

            if batch.len() < self.batch_size as usize {
                break;
            }
            skip = skip.saturating_add(self.batch_size);
        }

        info!(
            "Aggregate: {} {:?} -> count={} sum={} in {} batches",
            filter.event_type,
            filter.chain_name(),
            count,
            sum,
            batches
        );

        Ok(AggregateResult { count, sum })
    }
}
