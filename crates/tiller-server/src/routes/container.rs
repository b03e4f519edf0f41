// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Container operation endpoints.
//!
//! The second front door for instance operations. Takes JSON request
//! bodies and answers with a success-flagged response shape. Unlike
//! `/api/backend/instances/*`, an operation on a pair with no instance
//! provisions one first.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serde::{Deserialize, Serialize};
use tracing::info;

use tiller_datastore::Instance;

use crate::error::Result;
use crate::lifecycle::{IfMissing, InstanceOperation};
use crate::state::AppState;

/// Container operation route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/container/start", post(start_container))
        .route("/api/container/stop", post(stop_container))
        .route("/api/container/reset", post(reset_container))
}

/// Request body for container operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOperationRequest {
    /// Owning user id.
    pub user_id: i64,
    /// Image id.
    pub image_id: i64,
}

/// Response body for container operations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOperationResponse {
    /// Whether the backend acknowledged the operation.
    pub success: bool,
    /// Backend acknowledgement on success, error message on failure.
    pub message: String,
    /// The instance the operation ran against, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
}

fn respond(
    outcome: Result<InstanceOperation>,
) -> (StatusCode, Json<ContainerOperationResponse>) {
    match outcome {
        Ok(op) => (
            StatusCode::OK,
            Json(ContainerOperationResponse {
                success: true,
                message: op.message,
                instance: Some(op.instance),
            }),
        ),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(ContainerOperationResponse {
                success: false,
                message: err.to_string(),
                instance: None,
            }),
        ),
    }
}

/// `POST /api/container/start`
async fn start_container(
    State(state): State<AppState>,
    Json(request): Json<ContainerOperationRequest>,
) -> (StatusCode, Json<ContainerOperationResponse>) {
    info!(user_id = request.user_id, image_id = request.image_id, "Received start request");
    respond(
        state
            .lifecycle
            .start_instance(request.user_id, request.image_id, IfMissing::Create)
            .await,
    )
}

/// `POST /api/container/stop`
async fn stop_container(
    State(state): State<AppState>,
    Json(request): Json<ContainerOperationRequest>,
) -> (StatusCode, Json<ContainerOperationResponse>) {
    info!(user_id = request.user_id, image_id = request.image_id, "Received stop request");
    respond(
        state
            .lifecycle
            .stop_instance(request.user_id, request.image_id, IfMissing::Create)
            .await,
    )
}

/// `POST /api/container/reset`
async fn reset_container(
    State(state): State<AppState>,
    Json(request): Json<ContainerOperationRequest>,
) -> (StatusCode, Json<ContainerOperationResponse>) {
    info!(user_id = request.user_id, image_id = request.image_id, "Received reset request");
    respond(
        state
            .lifecycle
            .reset_instance(request.user_id, request.image_id, IfMissing::Create)
            .await,
    )
}
