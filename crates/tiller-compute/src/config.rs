// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the compute client.

use std::time::Duration;

use crate::error::{ComputeError, Result};

/// Configuration for the [`ComputeClient`](crate::ComputeClient).
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// Base URL of the compute backend, without a trailing slash.
    pub base_url: String,
    /// Bounded wait applied to every call.
    pub request_timeout: Duration,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3030".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ComputeConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TILLER_COMPUTE_URL`: Base URL (default: "http://localhost:3030")
    /// - `TILLER_COMPUTE_TIMEOUT_MS`: Per-call timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TILLER_COMPUTE_URL")
            .unwrap_or_else(|_| "http://localhost:3030".to_string());

        let request_timeout_ms: u64 = std::env::var("TILLER_COMPUTE_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| {
                ComputeError::Config(format!("invalid TILLER_COMPUTE_TIMEOUT_MS: {}", e))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComputeConfig::default();
        assert_eq!(config.base_url, "http://localhost:3030");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_methods() {
        let config = ComputeConfig::new()
            .with_base_url("http://compute:3030/")
            .with_request_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "http://compute:3030");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }
}
