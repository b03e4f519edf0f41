// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Live environment endpoints.

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::post;
use serde::Deserialize;

use crate::routes::{ApiError, Envelope};
use crate::state::AppState;

/// Live environment route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/backend/live/start", post(start_live))
        .route("/api/backend/live/stop", post(stop_live))
        .route("/api/backend/live/reset", post(reset_live))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: i64,
}

/// `POST /api/backend/live/start?userId=`
async fn start_live(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let message = state.lifecycle.start_live_environment(query.user_id).await?;
    Ok(Json(Envelope::message(message)))
}

/// `POST /api/backend/live/stop?userId=`
async fn stop_live(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let message = state.lifecycle.stop_live_environment(query.user_id).await?;
    Ok(Json(Envelope::message(message)))
}

/// `POST /api/backend/live/reset?userId=`
async fn reset_live(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let message = state.lifecycle.reset_live_environment(query.user_id).await?;
    Ok(Json(Envelope::message(message)))
}
