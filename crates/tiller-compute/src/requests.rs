// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request payloads for the compute backend.
//!
//! One tagged type per operation, carrying exactly the fields the backend
//! contract uses for that operation. Optional fields are omitted from the
//! JSON when absent: a partially provisioned live environment still gets
//! its operation sent with whatever data exists.

use serde::{Deserialize, Serialize};

/// Payload for instance start/stop/reset.
///
/// The backend receives the full hydrated record: the instance's own
/// fields plus the owner and image details the datastore denormalized
/// onto it. All three instance verbs share this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceOpRequest {
    /// Datastore id of the instance.
    pub id: i64,
    /// Container id from the last backend start, empty if never started.
    pub container_id: String,
    /// Instance display name.
    pub name: String,
    /// Owning user id.
    pub user_id: i64,
    /// Image id.
    pub image_id: i64,
    /// Persisted status at the time of the request.
    pub status: String,
    /// Registry reference of the image, when hydrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Image display name, when hydrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    /// Owner display name, when hydrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Owner email, when hydrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Payload for `POST /live/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStartRequest {
    /// User the session belongs to. The only field guaranteed present.
    pub user_id: i64,
    /// Datastore id of the live environment row, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_env_id: Option<i64>,
    /// Docker container id from a previous start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_container_id: Option<String>,
    /// Docker image the session runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    /// VNC host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnc_host: Option<String>,
    /// VNC port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnc_port: Option<u16>,
    /// VNC password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnc_password: Option<String>,
    /// Persisted status at the time of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Owner display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Owner email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Payload for `POST /live/stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStopRequest {
    /// User the session belongs to.
    pub user_id: i64,
    /// Datastore id of the live environment row, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_env_id: Option<i64>,
    /// Docker container id to stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_container_id: Option<String>,
}

/// Payload for `POST /live/reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResetRequest {
    /// User the session belongs to.
    pub user_id: i64,
    /// Datastore id of the live environment row, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_env_id: Option<i64>,
    /// Docker container id to recycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_container_id: Option<String>,
    /// Docker image to recreate the session from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
}

/// Payload for image registration and deregistration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSyncRequest {
    /// Datastore id of the image.
    pub id: i64,
    /// Registry reference the backend pulls from.
    pub image_ref: String,
    /// Human-readable name.
    pub name: String,
}
