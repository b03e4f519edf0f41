// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the datastore client.

use thiserror::Error;

/// Result type using [`DatastoreError`].
pub type Result<T> = std::result::Result<T, DatastoreError>;

/// Errors that can occur when talking to the datastore API.
///
/// A remote 404 is a defined "not found" signal, distinguished from a
/// transport failure: callers branch on absence, they do not crash on it.
/// Timeouts are treated identically to connection failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatastoreError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The datastore could not be reached, or the call exceeded its
    /// bounded wait.
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    /// User record absent in the store.
    #[error("User not found with id={0}")]
    UserNotFound(i64),

    /// Image record absent in the store.
    #[error("Image not found with id={0}")]
    ImageNotFound(i64),

    /// Instance record absent in the store.
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// Live environment record absent in the store.
    #[error("Live environment not found for userId={0}")]
    LiveEnvironmentNotFound(i64),

    /// The store rejected a create because the record already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The store answered with an unexpected non-2xx status.
    #[error("datastore returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode datastore response: {0}")]
    Decode(String),
}

impl DatastoreError {
    /// Whether this error means the referenced record is absent, as
    /// opposed to the store being unreachable or misbehaving.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DatastoreError::UserNotFound(_)
                | DatastoreError::ImageNotFound(_)
                | DatastoreError::InstanceNotFound(_)
                | DatastoreError::LiveEnvironmentNotFound(_)
        )
    }
}

impl From<reqwest::Error> for DatastoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return DatastoreError::Decode(err.to_string());
        }
        // Timeout and connect failures collapse into one condition on
        // purpose: exceeding the bounded wait is treated identically to a
        // connection failure.
        DatastoreError::Unavailable(err.to_string())
    }
}
