// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Bridge backend server: query layer between the explorer frontend and the
//! bridge event indexer.

use anyhow::Result;
use bridge_backend::config::{Config, LogFormat};
use bridge_backend::{router, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Missing indexer configuration is a setup error: fail before anything starts
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("bridge_backend=info".parse()?)
        .add_directive("tower_http=warn".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(env_filter);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    info!("Starting Bridge Backend Server");
    info!("Configuration:");
    info!("  Indexer: {}", config.indexer_url);
    info!("  L2 chain: {}", config.l2_chain_name.as_deref().unwrap_or("(all chains)"));
    info!("  Max page size: {}", config.max_page_size);
    info!("  Items per page: {}", config.items_per_page);
    info!("  Request timeout: {:?}", config.request_timeout);
    info!("  Server Port: {}", config.port);

    let port = config.port;
    let state = Arc::new(AppState::new(config)?);
    let shutdown = state.shutdown.clone();
    let app = router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Bridge Backend listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down, cancelling in-flight aggregations");
            shutdown.cancel();
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
