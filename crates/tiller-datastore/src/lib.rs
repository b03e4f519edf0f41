// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tiller Datastore Client
//!
//! Typed client for the datastore API, the remote service of record for
//! users, images, instances, and live environments. This crate is pure
//! request/response mapping with bounded timeouts: no business logic, no
//! caching, no retries. Every read may be stale by the time the caller
//! acts on it; the orchestration layer treats writes as best-effort
//! synchronization, never as transactions.
//!
//! # Example
//!
//! ```no_run
//! use tiller_datastore::{DatastoreClient, DatastoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DatastoreClient::new(DatastoreConfig::from_env()?)?;
//!
//! let user = client.get_user(1).await?;
//! println!("user: {}", user.name);
//!
//! for instance in client.instances_by_user(user.id).await? {
//!     println!("{} -> {:?}", instance.name, instance.status);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::DatastoreClient;
pub use config::DatastoreConfig;
pub use error::{DatastoreError, Result};
pub use types::{Image, Instance, InstanceStatus, LiveEnvironment, NewImage, NewInstance, User};
