// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Image endpoints.

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{delete, get, post};
use serde::Deserialize;

use tiller_datastore::Image;

use crate::routes::{ApiError, Envelope};
use crate::state::AppState;

/// Image route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/backend/images", get(list_images))
        .route("/api/backend/images/add", post(add_image))
        .route("/api/backend/images/remove", delete(remove_image))
}

/// `GET /api/backend/images`, listed straight from the datastore.
async fn list_images(State(state): State<AppState>) -> Result<Json<Vec<Image>>, ApiError> {
    let images = state.lifecycle.list_images().await?;
    Ok(Json(images))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddImageQuery {
    image_ref: String,
    name: String,
}

/// `POST /api/backend/images/add?imageRef=&name=`
async fn add_image(
    State(state): State<AppState>,
    Query(query): Query<AddImageQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let registration = state
        .lifecycle
        .add_image(&query.image_ref, &query.name)
        .await?;
    Ok(Json(Envelope::with_data(
        registration.message,
        registration.image,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveImageQuery {
    image_id: i64,
}

/// `DELETE /api/backend/images/remove?imageId=`
async fn remove_image(
    State(state): State<AppState>,
    Query(query): Query<RemoveImageQuery>,
) -> Result<Json<Envelope>, ApiError> {
    let message = state.lifecycle.remove_image(query.image_id).await?;
    Ok(Json(Envelope::message(message)))
}
