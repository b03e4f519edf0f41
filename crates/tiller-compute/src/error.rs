// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the compute client.

use thiserror::Error;

/// Result type using [`ComputeError`].
pub type Result<T> = std::result::Result<T, ComputeError>;

/// Errors that can occur when talking to the compute backend.
///
/// The backend's failure surface is deliberately flat: any non-2xx
/// response or transport error collapses into [`ComputeError::Backend`]
/// carrying the raw message. Callers get a success/failure boundary and
/// the backend's own words, nothing more.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComputeError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend rejected the operation or could not be reached.
    #[error("compute backend error: {0}")]
    Backend(String),
}
