// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP endpoint definitions.
//!
//! The transport layer is a thin caller of the orchestrator: parameter
//! binding, response envelopes, and error-to-status mapping live here
//! and nothing else does.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tiller_datastore::DatastoreError;

use crate::error::LifecycleError;
use crate::state::AppState;

pub mod container;
pub mod images;
pub mod instances;
pub mod live;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(live::routes())
        .merge(images::routes())
        .merge(instances::routes())
        .merge(container::routes())
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint. Answers without touching either remote service.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": state.version,
    }))
}

/// Success envelope: `{ message, data? }`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    /// Raw acknowledgement or human-readable outcome.
    pub message: String,
    /// Operation-specific payload, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Envelope carrying a message and a data payload.
    pub fn with_data(message: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            message: message.into(),
            data: serde_json::to_value(data).ok(),
        }
    }
}

/// Error envelope: `{ error }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Orchestrator error adapted to an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LifecycleError);

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LifecycleError::InstanceMissing { .. } => StatusCode::NOT_FOUND,
            LifecycleError::Datastore(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            LifecycleError::Datastore(DatastoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            LifecycleError::Datastore(DatastoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            LifecycleError::Datastore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LifecycleError::Compute(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_compute::ComputeError;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError(LifecycleError::Datastore(DatastoreError::ImageNotFound(42)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError(LifecycleError::InstanceMissing {
            user_id: 1,
            image_id: 7,
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn remote_failures_map_to_502() {
        let err = ApiError(LifecycleError::Compute(ComputeError::Backend(
            "boom".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = ApiError(LifecycleError::Datastore(DatastoreError::Unavailable(
            "timed out".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError(LifecycleError::Datastore(DatastoreError::AlreadyExists(
            "dup".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
