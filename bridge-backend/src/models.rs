// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Bridge event models shared by the indexer client, the aggregate counter
//! and the HTTP surface.

use crate::amount::Amount;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Direction of a bridge transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Deposit, // L1 -> L2
    #[default]
    Withdraw, // L2 -> L1
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Deposit => "DEPOSIT",
            EventType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEPOSIT" => Ok(EventType::Deposit),
            "WITHDRAW" => Ok(EventType::Withdraw),
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

/// Event type plus optional chain filter.
///
/// An empty chain name is the same as no chain filter; the indexer would
/// otherwise match it literally against `chainName = ""`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFilter {
    pub event_type: EventType,
    chain_name: Option<String>,
}

impl EventFilter {
    pub fn new(event_type: EventType, chain_name: Option<String>) -> Self {
        Self {
            event_type,
            chain_name: chain_name.filter(|name| !name.trim().is_empty()),
        }
    }

    pub fn chain_name(&self) -> Option<&str> {
        self.chain_name.as_deref()
    }
}

// ============================================================================
// INDEXER RECORDS
// ============================================================================

/// One bridge transfer record as returned by the indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String, // decimal string, never parsed as f64
    #[serde(default, deserialize_with = "string_or_number")]
    pub block_number: String,
    #[serde(default)]
    pub chain_name: String,
    pub event_type: EventType,
    #[serde(default)]
    pub from: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: String, // unix seconds
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub verse_id: String,
}

/// Projection scanned by the aggregate counter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventAmount {
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

/// Projection used to count matching events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventId {
    pub id: String,
}

/// Per-day bridge aggregate maintained by the indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBridgeStat {
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub verse_id: String,
    #[serde(default)]
    pub chain_name: String,
    pub date: String, // YYYY-MM-DD
    pub event_type: EventType,
    #[serde(rename = "total_amount", deserialize_with = "string_or_number")]
    pub total_amount: String,
    #[serde(rename = "accumulated_amount", deserialize_with = "string_or_number")]
    pub accumulated_amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub count: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub block_time: String,
}

/// Sort direction accepted by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Count and exact sum over every event matching a filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AggregateResult {
    pub count: u64,
    pub sum: Amount,
}

/// Accept both `"123"` and `123` from the indexer and keep the decimal text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
