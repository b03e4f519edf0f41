// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Record types served by the datastore API.
//!
//! Wire format is camelCase JSON. All records are owned by the remote
//! store; instances of these structs are request-scoped copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance status as persisted by the datastore.
///
/// The informal state machine is `created -> running <-> stopped`; a reset
/// drives to `stopped` regardless of source state. No transition is
/// rejected anywhere, so these values describe history, not legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Record exists but the compute backend has never started it.
    Created,
    /// Last acknowledged backend operation was a start.
    Running,
    /// Last acknowledged backend operation was a stop or reset.
    Stopped,
}

impl InstanceStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Created => "created",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user record. Read-only from this service's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Datastore-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// When the user was created, if the datastore reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A named reference to a runnable environment template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Datastore-assigned identifier.
    pub id: i64,
    /// Registry reference the compute backend pulls from.
    pub image_ref: String,
    /// Human-readable name.
    pub name: String,
}

/// Create payload for an image; the datastore assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    /// Registry reference the compute backend pulls from.
    pub image_ref: String,
    /// Human-readable name.
    pub name: String,
}

/// One user's running or stopped environment for one image.
///
/// At most one instance should exist per (user_id, image_id) pair. That
/// invariant is upheld by find-or-create discipline in the orchestrator,
/// not by a store constraint, so reads must tolerate violations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Datastore-assigned identifier.
    pub id: i64,
    /// Container id assigned by the compute backend; empty until the
    /// backend first starts the instance.
    #[serde(default)]
    pub container_id: String,
    /// Display name, `<userName>_<imageName>` at creation time.
    pub name: String,
    /// Owning user.
    pub user_id: i64,
    /// Image the instance runs.
    pub image_id: i64,
    /// Persisted status; a lagging mirror of the compute backend's truth.
    pub status: InstanceStatus,
    /// Denormalized owner record, populated by the datastore on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Denormalized image record, populated by the datastore on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

/// Create payload for an instance; the datastore assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstance {
    /// Container id, empty at creation (set later by the compute backend).
    pub container_id: String,
    /// Display name.
    pub name: String,
    /// Owning user.
    pub user_id: i64,
    /// Image the instance runs.
    pub image_id: i64,
    /// Initial status, `created` for fresh instances.
    pub status: InstanceStatus,
    /// Denormalized owner record forwarded to the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Denormalized image record forwarded to the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

/// A per-user VNC-accessible session record, distinct from [`Instance`].
///
/// Zero-or-one exists per user. Most fields are optional because rows are
/// created out-of-band and may be partially populated; the orchestrator
/// forwards whatever is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEnvironment {
    /// Datastore-assigned identifier.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Docker container id, when the backend has created one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_container_id: Option<String>,
    /// Docker image the session runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    /// VNC host for the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnc_host: Option<String>,
    /// VNC port for the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnc_port: Option<u16>,
    /// VNC password for the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnc_password: Option<String>,
    /// Observed values: `running`, `stopped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
