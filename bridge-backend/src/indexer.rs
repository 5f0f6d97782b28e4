// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! GraphQL client for the bridge event indexer.
//!
//! Every bridge query comes in two shapes: event type only, and event type
//! plus chain. The chain variant is sent only when a chain name is present,
//! never with an empty or null chain.

use crate::config::Config;
use crate::error::IndexerError;
use crate::models::{
    BridgeEvent, DailyBridgeStat, EventAmount, EventFilter, EventId, OrderDirection,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// QUERIES
// ============================================================================

pub const PAGE_QUERY_EVENT_TYPE_ONLY: &str = r#"
query BridgeEventsPage($first: Int!, $skip: Int!, $eventType: String!) {
  bridgeEvents(
    orderBy: timestamp,
    orderDirection: desc,
    first: $first,
    skip: $skip,
    where: { eventType: $eventType }
  ) {
    amount
    blockNumber
    chainName
    eventType
    from
    timestamp
    to
    transactionHash
    verseId
  }
}
"#;

pub const PAGE_QUERY_WITH_CHAIN: &str = r#"
query BridgeEventsPage($first: Int!, $skip: Int!, $eventType: String!, $chainName: String!) {
  bridgeEvents(
    orderBy: timestamp,
    orderDirection: desc,
    first: $first,
    skip: $skip,
    where: { eventType: $eventType, chainName: $chainName }
  ) {
    amount
    blockNumber
    chainName
    eventType
    from
    timestamp
    to
    transactionHash
    verseId
  }
}
"#;

pub const COUNT_QUERY_EVENT_TYPE_ONLY: &str = r#"
query CountBridgeEvents($first: Int!, $eventType: String!) {
  bridgeEvents(first: $first, where: { eventType: $eventType }) {
    id
  }
}
"#;

pub const COUNT_QUERY_WITH_CHAIN: &str = r#"
query CountBridgeEvents($first: Int!, $eventType: String!, $chainName: String!) {
  bridgeEvents(first: $first, where: { eventType: $eventType, chainName: $chainName }) {
    id
  }
}
"#;

pub const AMOUNT_QUERY_EVENT_TYPE_ONLY: &str = r#"
query BridgeEventAmounts($first: Int!, $skip: Int!, $eventType: String!) {
  bridgeEvents(first: $first, skip: $skip, where: { eventType: $eventType }) {
    amount
    id
  }
}
"#;

pub const AMOUNT_QUERY_WITH_CHAIN: &str = r#"
query BridgeEventAmounts($first: Int!, $skip: Int!, $eventType: String!, $chainName: String!) {
  bridgeEvents(first: $first, skip: $skip, where: { eventType: $eventType, chainName: $chainName }) {
    amount
    id
  }
}
"#;

pub const DAILY_STATS_QUERY: &str = r#"
query GetDailyBridgeStats(
  $first: Int!,
  $orderBy: DailyBridgeStat_orderBy!,
  $orderDirection: OrderDirection!,
  $startDate: String!,
  $endDate: String!
) {
  dailyBridgeStats(
    first: $first
    orderBy: $orderBy
    orderDirection: $orderDirection
    where: { date_gte: $startDate, date_lte: $endDate }
  ) {
    id
    verseId
    chainName
    date
    eventType
    total_amount
    accumulated_amount
    count
    blockTime
  }
}
"#;

const PING_QUERY: &str = "query Ping { bridgeEvents(first: 1) { id } }";

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeEventsData<T> {
    bridge_events: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyStatsData {
    daily_bridge_stats: Option<Vec<DailyBridgeStat>>,
}

/// Parameters of the daily bridge stats query
#[derive(Debug, Clone)]
pub struct DailyStatsQuery {
    pub first: u32,
    pub order_direction: OrderDirection,
    pub start_date: String, // YYYY-MM-DD, inclusive
    pub end_date: String,   // YYYY-MM-DD, inclusive
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Read access to bridge events, implemented by the GraphQL client and by
/// in-memory sources in tests.
#[async_trait]
pub trait BridgeEventSource: Send + Sync {
    /// One page of events, newest first.
    async fn fetch_page(
        &self,
        filter: &EventFilter,
        first: u32,
        skip: u32,
    ) -> Result<Vec<BridgeEvent>, IndexerError>;

    /// Identifiers of matching events, capped at the indexer's page size.
    async fn fetch_count(&self, filter: &EventFilter) -> Result<Vec<EventId>, IndexerError>;

    /// One batch of `{amount, id}` pairs for aggregation.
    async fn fetch_amounts(
        &self,
        filter: &EventFilter,
        first: u32,
        skip: u32,
    ) -> Result<Vec<EventAmount>, IndexerError>;
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct IndexerClient {
    http_client: HttpClient,
    url: String,
    count_cap: u32,
}

impl IndexerClient {
    pub fn new(url: String, request_timeout: Duration, count_cap: u32) -> Result<Self, IndexerError> {
        let http_client = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(IndexerError::Transport)?;

        Ok(Self {
            http_client,
            url,
            count_cap,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, IndexerError> {
        Self::new(
            config.indexer_url.clone(),
            config.request_timeout,
            config.max_page_size,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Daily aggregates between two dates, inclusive.
    pub async fn fetch_daily_stats(
        &self,
        query: &DailyStatsQuery,
    ) -> Result<Vec<DailyBridgeStat>, IndexerError> {
        let variables = json!({
            "first": query.first,
            "orderBy": "date",
            "orderDirection": query.order_direction.as_str(),
            "startDate": query.start_date,
            "endDate": query.end_date,
        });

        let data: DailyStatsData = self.request(DAILY_STATS_QUERY, variables).await?;
        data.daily_bridge_stats.ok_or_else(|| {
            IndexerError::MalformedResponse("response does not contain dailyBridgeStats".into())
        })
    }

    /// Cheapest possible query, used by the health endpoint.
    pub async fn ping(&self) -> Result<(), IndexerError> {
        let data: BridgeEventsData<EventId> = self.request(PING_QUERY, json!({})).await?;
        bridge_events(data).map(|_| ())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, IndexerError> {
        debug!("Indexer: POST {} variables={}", self.url, variables);

        let resp = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Indexer: HTTP {} from {}", status.as_u16(), self.url);
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let gql: GraphqlResponse<T> = resp.json().await?;

        if !gql.errors.is_empty() {
            let messages: Vec<String> = gql.errors.into_iter().map(|e| e.message).collect();
            warn!("Indexer: query errors: {:?}", messages);
            return Err(IndexerError::Graphql(messages));
        }

        gql.data
            .ok_or_else(|| IndexerError::MalformedResponse("response has no data".into()))
    }
}

#[async_trait]
impl BridgeEventSource for IndexerClient {
    async fn fetch_page(
        &self,
        filter: &EventFilter,
        first: u32,
        skip: u32,
    ) -> Result<Vec<BridgeEvent>, IndexerError> {
        let query = select_query(filter, PAGE_QUERY_EVENT_TYPE_ONLY, PAGE_QUERY_WITH_CHAIN);
        let variables = filter_variables(filter, first, Some(skip));

        let data: BridgeEventsData<BridgeEvent> = self.request(query, variables).await?;
        let mut events = bridge_events(data)?;

        events.truncate(first as usize);
        sort_newest_first(&mut events);

        debug!("Indexer: fetched {} {} events (skip={})", events.len(), filter.event_type, skip);
        Ok(events)
    }

    async fn fetch_count(&self, filter: &EventFilter) -> Result<Vec<EventId>, IndexerError> {
        let query = select_query(filter, COUNT_QUERY_EVENT_TYPE_ONLY, COUNT_QUERY_WITH_CHAIN);
        let variables = filter_variables(filter, self.count_cap, None);

        let data: BridgeEventsData<EventId> = self.request(query, variables).await?;
        bridge_events(data)
    }

    async fn fetch_amounts(
        &self,
        filter: &EventFilter,
        first: u32,
        skip: u32,
    ) -> Result<Vec<EventAmount>, IndexerError> {
        let query = select_query(filter, AMOUNT_QUERY_EVENT_TYPE_ONLY, AMOUNT_QUERY_WITH_CHAIN);
        let variables = filter_variables(filter, first, Some(skip));

        let data: BridgeEventsData<EventAmount> = self.request(query, variables).await?;
        bridge_events(data)
    }
}

fn bridge_events<T>(data: BridgeEventsData<T>) -> Result<Vec<T>, IndexerError> {
    data.bridge_events.ok_or_else(|| {
        IndexerError::MalformedResponse("response does not contain bridgeEvents".into())
    })
}

/// Pick the query shape matching the filter.
pub fn select_query(
    filter: &EventFilter,
    event_type_only: &'static str,
    with_chain: &'static str,
) -> &'static str {
    if filter.chain_name().is_some() {
        with_chain
    } else {
        event_type_only
    }
}

/// Variables for a bridge events query; `chainName` only when filtering by chain.
pub fn filter_variables(filter: &EventFilter, first: u32, skip: Option<u32>) -> Value {
    let mut vars = Map::new();
    vars.insert("eventType".into(), json!(filter.event_type.as_str()));
    if let Some(chain_name) = filter.chain_name() {
        vars.insert("chainName".into(), json!(chain_name));
    }
    vars.insert("first".into(), json!(first));
    if let Some(skip) = skip {
        vars.insert("skip".into(), json!(skip));
    }
    Value::Object(vars)
}

/// Order by timestamp descending, then transaction hash ascending, then block
/// number descending. Stable for anything still equal.
pub fn sort_newest_first(events: &mut [BridgeEvent]) {
    fn numeric(s: &str) -> u64 {
        s.trim().parse().unwrap_or(0)
    }

    events.sort_by(|a, b| {
        numeric(&b.timestamp)
            .cmp(&numeric(&a.timestamp))
            .then_with(|| a.transaction_hash.cmp(&b.transaction_hash))
            .then_with(|| numeric(&b.block_number).cmp(&numeric(&a.block_number)))
    });
}
