// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tiller Server - Container Lifecycle Orchestration
//!
//! An HTTP server responsible for:
//! - Instance lifecycle (start, stop, reset) against the compute backend
//! - Live environment sessions (start, stop, reset) per user
//! - Image registration and removal (datastore + compute dual-write)

use std::sync::Arc;

use tracing::{info, warn};

use tiller_compute::ComputeClient;
use tiller_datastore::DatastoreClient;
use tiller_server::config::Config;
use tiller_server::lifecycle::Lifecycle;
use tiller_server::routes;
use tiller_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiller_server=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        bind_addr = %config.bind_addr,
        datastore_url = %config.datastore.base_url,
        compute_url = %config.compute.base_url,
        "Starting Tiller Server"
    );

    // Build the gateway clients once; handlers share them through the
    // orchestrator.
    let datastore = Arc::new(DatastoreClient::new(config.datastore.clone())?);
    let compute = Arc::new(ComputeClient::new(config.compute.clone())?);

    let lifecycle = Arc::new(Lifecycle::new(datastore, compute));
    let app = routes::router(AppState::new(lifecycle));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Tiller Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tiller Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
