// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for tiller-server.

use thiserror::Error;
use tiller_compute::ComputeError;
use tiller_datastore::DatastoreError;

/// Orchestration errors.
///
/// Datastore failures during read steps abort the whole operation and
/// surface here; datastore failures during the post-success status
/// write-back never reach this type (they are logged and swallowed by the
/// write-back task). Compute failures always surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// Datastore API call failed.
    #[error("{0}")]
    Datastore(#[from] DatastoreError),

    /// Compute backend call failed.
    #[error("{0}")]
    Compute(#[from] ComputeError),

    /// No instance exists for the pair and the caller required one.
    #[error("No instance found for userId={user_id} imageId={image_id}")]
    InstanceMissing {
        /// Owning user id.
        user_id: i64,
        /// Image id.
        image_id: i64,
    },
}

/// Result type using [`LifecycleError`].
pub type Result<T> = std::result::Result<T, LifecycleError>;
