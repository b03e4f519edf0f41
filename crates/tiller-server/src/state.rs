// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared application state.

use std::sync::Arc;

use crate::lifecycle::Lifecycle;

/// State shared across all request handlers.
///
/// The orchestrator (and through it both gateway clients) is injected at
/// construction time; handlers never reach for global client instances.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle orchestrator.
    pub lifecycle: Arc<Lifecycle>,
    /// Server version string reported by the health endpoint.
    pub version: &'static str,
}

impl AppState {
    /// Create application state around an orchestrator.
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            lifecycle,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
