// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Instance endpoints.
//!
//! This front door requires the instance to exist already; clients that
//! want implicit creation go through `/api/container/*` instead.

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use serde::Deserialize;

use tiller_datastore::Instance;

use crate::lifecycle::IfMissing;
use crate::routes::{ApiError, Envelope};
use crate::state::AppState;

/// Instance route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/backend/instances", get(list_instances))
        .route("/api/backend/instances/start", post(start_instance))
        .route("/api/backend/instances/stop", post(stop_instance))
        .route("/api/backend/instances/reset", post(reset_instance))
}

/// `GET /api/backend/instances`, listed straight from the datastore.
async fn list_instances(State(state): State<AppState>) -> Result<Json<Vec<Instance>>, ApiError> {
    let instances = state.lifecycle.list_instances().await?;
    Ok(Json(instances))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceQuery {
    user_id: i64,
    image_id: i64,
}

/// `POST /api/backend/instances/start?userId=&imageId=`
async fn start_instance(
    State(state): State<AppState>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let outcome = state
        .lifecycle
        .start_instance(query.user_id, query.image_id, IfMissing::Reject)
        .await?;
    Ok(Json(Envelope::message(outcome.message)))
}

/// `POST /api/backend/instances/stop?userId=&imageId=`
async fn stop_instance(
    State(state): State<AppState>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let outcome = state
        .lifecycle
        .stop_instance(query.user_id, query.image_id, IfMissing::Reject)
        .await?;
    Ok(Json(Envelope::message(outcome.message)))
}

/// `POST /api/backend/instances/reset?userId=&imageId=`
async fn reset_instance(
    State(state): State<AppState>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let outcome = state
        .lifecycle
        .reset_instance(query.user_id, query.image_id, IfMissing::Reject)
        .await?;
    Ok(Json(Envelope::message(outcome.message)))
}
