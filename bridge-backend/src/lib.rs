// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Bridge event backend for the Verse explorer.
//!
//! Fetches deposit/withdrawal events from the bridge indexer, paginates and
//! counts them, sums amounts exactly, and validates transfer amounts.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod aggregate;
pub mod amount;
pub mod config;
pub mod error;
pub mod handlers;
pub mod indexer;
pub mod models;
pub mod pagination;
pub mod session;
pub mod validation;
pub mod view;

use aggregate::{BatchScanAggregator, EventAggregator};
use config::Config;
use error::IndexerError;
use indexer::IndexerClient;
use pagination::PaginationError;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub indexer: Arc<IndexerClient>,
    pub aggregator: Arc<dyn EventAggregator>,
    /// Tripped on shutdown; aggregations run on child tokens
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, IndexerError> {
        let indexer = Arc::new(IndexerClient::from_config(&config)?);
        let aggregator = Arc::new(BatchScanAggregator::new(
            indexer.clone(),
            config.max_page_size,
        ));

        Ok(Self {
            config,
            indexer,
            aggregator,
            shutdown: CancellationToken::new(),
        })
    }
}

/// HTTP routes of the bridge backend
pub fn router(state: Arc<AppState>) -> Router {
    // Define your own restricted CORS policy here if needed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/bridge_events", get(handlers::get_bridge_events))
        .route("/api/bridge_events/stats", get(handlers::get_bridge_event_stats))
        .route("/api/daily_stats", get(handlers::get_daily_stats))
        .route("/api/validate_amount", post(handlers::validate_amount))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API errors, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Indexer(#[from] IndexerError),
}

impl From<PaginationError> for ApiError {
    fn from(e: PaginationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Indexer(IndexerError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Indexer(IndexerError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Indexer(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
