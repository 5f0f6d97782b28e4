// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! HTTP endpoint handlers.

use crate::indexer::{BridgeEventSource, DailyStatsQuery};
use crate::models::{AggregateResult, DailyBridgeStat, EventFilter, EventType, OrderDirection};
use crate::pagination::{PageInfo, PageQuery};
use crate::validation::{effective_decimals, validate_amount as is_valid_amount};
use crate::view::{to_rows, EventRow};
use crate::{ApiError, AppState};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_DAILY_STATS_LIMIT: u32 = 100;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub event_type: Option<String>,
    /// Absent: configured L2 chain. Present but empty: all chains.
    pub chain_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
    pub event_type: Option<String>,
    pub chain_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub items: Vec<EventRow>,
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct DailyStatsParams {
    pub start_date: String,
    pub end_date: String,
    pub first: Option<u32>,
    pub order_direction: Option<OrderDirection>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateAmountRequest {
    pub amount: String,
    pub decimals: Option<u32>, // token precision; 0 or absent means 18
}

#[derive(Debug, Serialize)]
pub struct ValidateAmountResponse {
    pub valid: bool,
    pub decimals: u32,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// One page of bridge events plus pagination info
pub async fn get_bridge_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
) -> Result<Json<EventsResponse>, ApiError> {
    let (event_type, chain_name) = resolve_filter(
        &state,
        params.event_type.as_deref(),
        params.chain_name.as_deref(),
    )?;
    let items_per_page = params.items_per_page.unwrap_or(state.config.items_per_page);
    if items_per_page > state.config.max_page_size {
        return Err(ApiError::BadRequest(format!(
            "items_per_page must not exceed {}",
            state.config.max_page_size
        )));
    }

    let query = PageQuery::new(
        params.page.unwrap_or(1),
        items_per_page,
        event_type,
        chain_name,
    )?;

    info!(
        "Bridge events: {} chain={:?} page={}",
        query.filter.event_type,
        query.filter.chain_name(),
        query.pagination.page()
    );

    let count = state.indexer.fetch_count(&query.filter).await.map_err(|e| {
        error!("Failed to count bridge events: {}", e);
        e
    })?;
    let events = state
        .indexer
        .fetch_page(&query.filter, query.first(), query.skip())
        .await
        .map_err(|e| {
            error!("Failed to fetch bridge events: {}", e);
            e
        })?;

    Ok(Json(EventsResponse {
        items: to_rows(&events),
        pagination: query.pagination.page_info(count.len() as u64),
    }))
}

/// Count and exact sum over every matching event
pub async fn get_bridge_event_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<AggregateResult>, ApiError> {
    let (event_type, chain_name) = resolve_filter(
        &state,
        params.event_type.as_deref(),
        params.chain_name.as_deref(),
    )?;
    let filter = EventFilter::new(event_type, chain_name);

    let cancel = state.shutdown.child_token();
    let totals = state.aggregator.aggregate(&filter, &cancel).await.map_err(|e| {
        error!("Failed to aggregate bridge events: {}", e);
        e
    })?;

    Ok(Json(totals))
}

/// Per-day bridge aggregates between two dates, inclusive
pub async fn get_daily_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyStatsParams>,
) -> Result<Json<Vec<DailyBridgeStat>>, ApiError> {
    let start = parse_date("start_date", &params.start_date)?;
    let end = parse_date("end_date", &params.end_date)?;
    if start > end {
        return Err(ApiError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let query = DailyStatsQuery {
        first: params
            .first
            .unwrap_or(DEFAULT_DAILY_STATS_LIMIT)
            .clamp(1, state.config.max_page_size),
        order_direction: params.order_direction.unwrap_or_default(),
        start_date: start.format("%Y-%m-%d").to_string(),
        end_date: end.format("%Y-%m-%d").to_string(),
    };

    let stats = state.indexer.fetch_daily_stats(&query).await.map_err(|e| {
        error!("Failed to fetch daily bridge stats: {}", e);
        e
    })?;

    Ok(Json(stats))
}

/// Whether a typed transfer amount may be submitted
pub async fn validate_amount(
    Json(req): Json<ValidateAmountRequest>,
) -> Json<ValidateAmountResponse> {
    let decimals = effective_decimals(req.decimals);
    Json(ValidateAmountResponse {
        valid: is_valid_amount(&req.amount, decimals),
        decimals,
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let indexer_health = state.indexer.ping().await.is_ok();

    Json(serde_json::json!({
        "status": if indexer_health { "healthy" } else { "unhealthy" },
        "indexer": if indexer_health { "up" } else { "down" },
    }))
}

// ============================================================================
// HELPERS
// ============================================================================

fn resolve_filter(
    state: &AppState,
    event_type: Option<&str>,
    chain_name: Option<&str>,
) -> Result<(EventType, Option<String>), ApiError> {
    let event_type = match event_type {
        None | Some("") => EventType::default(),
        Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
    };
    let chain_name = match chain_name {
        None => state.config.l2_chain_name.clone(),
        Some(name) => Some(name.to_string()),
    };
    Ok((event_type, chain_name))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("{} must be YYYY-MM-DD: {}", field, e)))
}
