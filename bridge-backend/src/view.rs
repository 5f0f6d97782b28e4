// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Display records for deposit/withdrawal lists and tables.

use crate::models::{BridgeEvent, EventType};
use chrono::{TimeZone, Utc};
use serde::Serialize;

/// One row of the bridge events table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    pub index: u64, // derived from block number
    pub validator_index: u64,
    pub block_number: u64,
    pub amount: String,
    pub timestamp: String,
    pub timestamp_iso: Option<String>,
    pub tx_hash: String,
    pub transaction_hash: String,
    pub chain_name: String,
    pub event_type: EventType,
    pub sender: String,
    pub receiver: String,
    pub verse_id: String,
}

impl From<&BridgeEvent> for EventRow {
    fn from(event: &BridgeEvent) -> Self {
        let block_number = parse_leading_u64(&event.block_number);
        EventRow {
            index: block_number,
            validator_index: 0,
            block_number,
            amount: event.amount.clone(),
            timestamp: event.timestamp.clone(),
            timestamp_iso: unix_seconds_to_rfc3339(&event.timestamp),
            tx_hash: event.transaction_hash.clone(),
            transaction_hash: event.transaction_hash.clone(),
            chain_name: event.chain_name.clone(),
            event_type: event.event_type,
            sender: event.from.clone(),
            receiver: event.to.clone(),
            verse_id: event.verse_id.clone(),
        }
    }
}

pub fn to_rows(events: &[BridgeEvent]) -> Vec<EventRow> {
    events.iter().map(EventRow::from).collect()
}

/// Lenient integer parse: skip leading whitespace, read the leading digit run,
/// and fall back to 0 when there is none or it overflows.
pub fn parse_leading_u64(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}

fn unix_seconds_to_rfc3339(raw: &str) -> Option<String> {
    let secs: i64 = raw.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single().map(|dt| dt.to_rfc3339())
}
