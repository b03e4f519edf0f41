// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the datastore client.

use std::time::Duration;

use crate::error::{DatastoreError, Result};

/// Configuration for the [`DatastoreClient`](crate::DatastoreClient).
#[derive(Debug, Clone)]
pub struct DatastoreConfig {
    /// Base URL of the datastore API, without a trailing slash.
    pub base_url: String,
    /// Bounded wait applied to every call. Exceeding it is treated the
    /// same as a connection failure.
    pub request_timeout: Duration,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DatastoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TILLER_DATASTORE_URL`: Base URL (default: "http://localhost:5050")
    /// - `TILLER_DATASTORE_TIMEOUT_MS`: Per-call timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TILLER_DATASTORE_URL")
            .unwrap_or_else(|_| "http://localhost:5050".to_string());

        let request_timeout_ms: u64 = std::env::var("TILLER_DATASTORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| {
                DatastoreError::Config(format!("invalid TILLER_DATASTORE_TIMEOUT_MS: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
