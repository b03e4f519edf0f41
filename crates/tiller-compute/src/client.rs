// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compute backend client.

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::ComputeConfig;
use crate::error::{ComputeError, Result};
use crate::requests::{
    ImageSyncRequest, InstanceOpRequest, LiveResetRequest, LiveStartRequest, LiveStopRequest,
};

/// Typed client for the compute backend.
///
/// One pooled `reqwest::Client` with a bounded per-call wait. Every
/// operation returns the backend's raw textual acknowledgement; any
/// non-2xx status or transport error becomes a [`ComputeError::Backend`].
/// Safe to share across tasks behind an `Arc`.
pub struct ComputeClient {
    http: reqwest::Client,
    config: ComputeConfig,
}

impl ComputeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ComputeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ComputeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ComputeConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    /// Send one operation payload and return the raw acknowledgement.
    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<String> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .http
            .request(method, &url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ComputeError::Backend(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ComputeError::Backend(e.to_string()))?;

        if !status.is_success() {
            return Err(ComputeError::Backend(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }

        debug!(path, "Compute backend acknowledged");
        Ok(body)
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Start an instance.
    #[instrument(skip(self, request), fields(instance_id = request.id))]
    pub async fn start_instance(&self, request: &InstanceOpRequest) -> Result<String> {
        self.send(Method::POST, "/instances/start", request).await
    }

    /// Stop an instance.
    #[instrument(skip(self, request), fields(instance_id = request.id))]
    pub async fn stop_instance(&self, request: &InstanceOpRequest) -> Result<String> {
        self.send(Method::POST, "/instances/stop", request).await
    }

    /// Reset an instance (stop and start fresh).
    #[instrument(skip(self, request), fields(instance_id = request.id))]
    pub async fn reset_instance(&self, request: &InstanceOpRequest) -> Result<String> {
        self.send(Method::POST, "/instances/reset", request).await
    }

    // =========================================================================
    // Live environments
    // =========================================================================

    /// Start a user's live environment session.
    #[instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn start_live_environment(&self, request: &LiveStartRequest) -> Result<String> {
        self.send(Method::POST, "/live/start", request).await
    }

    /// Stop a user's live environment session.
    #[instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn stop_live_environment(&self, request: &LiveStopRequest) -> Result<String> {
        self.send(Method::POST, "/live/stop", request).await
    }

    /// Reset a user's live environment session.
    #[instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn reset_live_environment(&self, request: &LiveResetRequest) -> Result<String> {
        self.send(Method::POST, "/live/reset", request).await
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Register an image with the backend so it can be pulled.
    #[instrument(skip(self, request), fields(image_id = request.id))]
    pub async fn add_image(&self, request: &ImageSyncRequest) -> Result<String> {
        self.send(Method::POST, "/images/add", request).await
    }

    /// Deregister an image from the backend.
    #[instrument(skip(self, request), fields(image_id = request.id))]
    pub async fn remove_image(&self, request: &ImageSyncRequest) -> Result<String> {
        self.send(Method::DELETE, "/images/remove", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ComputeClient {
        ComputeClient::new(ComputeConfig::new().with_base_url(server.uri())).unwrap()
    }

    fn instance_request() -> InstanceOpRequest {
        InstanceOpRequest {
            id: 5,
            container_id: "c1".to_string(),
            name: "alice_ubuntu".to_string(),
            user_id: 1,
            image_id: 7,
            status: "created".to_string(),
            image_ref: Some("ubuntu:24.04".to_string()),
            image_name: Some("ubuntu".to_string()),
            user_name: Some("alice".to_string()),
            user_email: Some("alice@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn start_instance_returns_raw_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instances/start"))
            .respond_with(ResponseTemplate::new(200).set_body_string("container c1 started"))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .start_instance(&instance_request())
            .await
            .unwrap();
        assert_eq!(ack, "container c1 started");
    }

    #[tokio::test]
    async fn live_stop_sends_only_present_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/live/stop"))
            .and(body_json(serde_json::json!({"userId": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .stop_live_environment(&LiveStopRequest {
                user_id: 9,
                live_env_id: None,
                docker_container_id: None,
            })
            .await
            .unwrap();
        assert_eq!(ack, "ok");
    }

    #[tokio::test]
    async fn non_2xx_maps_to_backend_error_with_raw_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instances/stop"))
            .respond_with(ResponseTemplate::new(500).set_body_string("no such container"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .stop_instance(&instance_request())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no such container"), "got: {}", message);
    }

    #[tokio::test]
    async fn transport_failure_maps_to_backend_error() {
        let client = ComputeClient::new(
            ComputeConfig::new()
                .with_base_url("http://127.0.0.1:1")
                .with_request_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = client
            .add_image(&ImageSyncRequest {
                id: 1,
                image_ref: "ubuntu:24.04".to_string(),
                name: "ubuntu".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::Backend(_)));
    }

    #[tokio::test]
    async fn remove_image_uses_delete_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/images/remove"))
            .and(body_json(serde_json::json!({
                "id": 7, "imageRef": "ubuntu:24.04", "name": "ubuntu"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("image removed"))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .remove_image(&ImageSyncRequest {
                id: 7,
                image_ref: "ubuntu:24.04".to_string(),
                name: "ubuntu".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ack, "image removed");
    }
}
