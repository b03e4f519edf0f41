// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for tiller-server.

use std::net::SocketAddr;

use tiller_compute::ComputeConfig;
use tiller_datastore::DatastoreConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Datastore API client configuration.
    pub datastore: DatastoreConfig,
    /// Compute backend client configuration.
    pub compute: ComputeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = std::env::var("TILLER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let datastore = DatastoreConfig::from_env()
            .map_err(|e| ConfigError::Gateway(e.to_string()))?;
        let compute =
            ComputeConfig::from_env().map_err(|e| ConfigError::Gateway(e.to_string()))?;

        Ok(Self {
            bind_addr,
            datastore,
            compute,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// A gateway client configuration value is invalid.
    #[error("Gateway configuration error: {0}")]
    Gateway(String),
}
