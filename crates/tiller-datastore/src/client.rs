// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Datastore API client.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::DatastoreConfig;
use crate::error::{DatastoreError, Result};
use crate::types::{Image, Instance, InstanceStatus, LiveEnvironment, NewImage, NewInstance, User};

/// Typed client for the datastore API.
///
/// Wraps one pooled `reqwest::Client` with the configured base URL and a
/// bounded per-call wait. One method per (entity, verb) pair; each call is
/// a single request with no retries and no side effects beyond the remote
/// write. Safe to share across tasks behind an `Arc`.
pub struct DatastoreClient {
    http: reqwest::Client,
    config: DatastoreConfig,
}

impl DatastoreClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DatastoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DatastoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(DatastoreConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Map a non-2xx response to the error taxonomy. 404 is a defined
    /// absence signal and maps through `not_found`; 409 means the store
    /// rejected a duplicate create.
    async fn check_status(
        response: reqwest::Response,
        not_found: impl FnOnce() -> DatastoreError,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            404 => not_found(),
            409 => DatastoreError::AlreadyExists(message),
            code => DatastoreError::Status {
                status: code,
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        not_found: impl FnOnce() -> DatastoreError,
    ) -> Result<T> {
        let response = Self::check_status(response, not_found).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DatastoreError::Decode(e.to_string()))
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Fetch a user by id.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<User> {
        debug!("Fetching user");
        let response = self
            .http
            .get(self.url(&format!("/api/users/{}", id)))
            .send()
            .await?;
        Self::decode(response, || DatastoreError::UserNotFound(id)).await
    }

    /// List all users.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        debug!("Listing users");
        let response = self.http.get(self.url("/api/users")).send().await?;
        Self::decode(response, || DatastoreError::Status {
            status: 404,
            message: "user collection missing".to_string(),
        })
        .await
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Fetch an image by id.
    #[instrument(skip(self))]
    pub async fn get_image(&self, id: i64) -> Result<Image> {
        debug!("Fetching image");
        let response = self
            .http
            .get(self.url(&format!("/api/images/{}", id)))
            .send()
            .await?;
        Self::decode(response, || DatastoreError::ImageNotFound(id)).await
    }

    /// List all images.
    #[instrument(skip(self))]
    pub async fn list_images(&self) -> Result<Vec<Image>> {
        debug!("Listing images");
        let response = self.http.get(self.url("/api/images")).send().await?;
        Self::decode(response, || DatastoreError::Status {
            status: 404,
            message: "image collection missing".to_string(),
        })
        .await
    }

    /// Persist a new image; the store assigns the id.
    #[instrument(skip(self, image), fields(name = %image.name))]
    pub async fn create_image(&self, image: &NewImage) -> Result<Image> {
        debug!("Creating image");
        let response = self
            .http
            .post(self.url("/api/images"))
            .json(image)
            .send()
            .await?;
        Self::decode(response, || {
            DatastoreError::AlreadyExists(format!("image '{}' rejected by store", image.name))
        })
        .await
    }

    /// Delete an image by id.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: i64) -> Result<()> {
        debug!("Deleting image");
        let response = self
            .http
            .delete(self.url(&format!("/api/images/{}", id)))
            .send()
            .await?;
        Self::check_status(response, || DatastoreError::ImageNotFound(id)).await?;
        Ok(())
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Fetch an instance by id.
    #[instrument(skip(self))]
    pub async fn get_instance(&self, id: i64) -> Result<Instance> {
        debug!("Fetching instance");
        let response = self
            .http
            .get(self.url(&format!("/api/instances/{}", id)))
            .send()
            .await?;
        Self::decode(response, || DatastoreError::InstanceNotFound(format!("id={}", id))).await
    }

    /// Fetch an instance by the container id the compute backend assigned.
    #[instrument(skip(self))]
    pub async fn get_instance_by_container(&self, container_id: &str) -> Result<Instance> {
        debug!("Fetching instance by container id");
        let response = self
            .http
            .get(self.url(&format!("/api/instances/container/{}", container_id)))
            .send()
            .await?;
        Self::decode(response, || {
            DatastoreError::InstanceNotFound(format!("containerId={}", container_id))
        })
        .await
    }

    /// List all instances.
    #[instrument(skip(self))]
    pub async fn list_instances(&self) -> Result<Vec<Instance>> {
        debug!("Listing instances");
        let response = self.http.get(self.url("/api/instances")).send().await?;
        Self::decode(response, || DatastoreError::Status {
            status: 404,
            message: "instance collection missing".to_string(),
        })
        .await
    }

    /// List all instances belonging to a user.
    #[instrument(skip(self))]
    pub async fn instances_by_user(&self, user_id: i64) -> Result<Vec<Instance>> {
        debug!("Fetching instances for user");
        let response = self
            .http
            .get(self.url(&format!("/api/instances/user/{}", user_id)))
            .send()
            .await?;
        Self::decode(response, || DatastoreError::UserNotFound(user_id)).await
    }

    /// List instances for a (user, image) pair.
    ///
    /// The datastore API has no combined filter, so this fetches all of
    /// the user's instances and filters client-side. O(n) in the user's
    /// instance count; acceptable while per-user counts stay small. Known
    /// scaling limit, deliberately not pushed down to the store.
    #[instrument(skip(self))]
    pub async fn instances_by_user_and_image(
        &self,
        user_id: i64,
        image_id: i64,
    ) -> Result<Vec<Instance>> {
        let instances = self.instances_by_user(user_id).await?;
        Ok(instances
            .into_iter()
            .filter(|instance| instance.image_id == image_id)
            .collect())
    }

    /// Persist a new instance; the store assigns the id.
    #[instrument(skip(self, instance), fields(name = %instance.name))]
    pub async fn create_instance(&self, instance: &NewInstance) -> Result<Instance> {
        debug!("Creating instance");
        let response = self
            .http
            .post(self.url("/api/instances"))
            .json(instance)
            .send()
            .await?;
        Self::decode(response, || {
            DatastoreError::AlreadyExists(format!("instance '{}' rejected by store", instance.name))
        })
        .await
    }

    /// Replace an instance record.
    #[instrument(skip(self, instance))]
    pub async fn update_instance(&self, id: i64, instance: &Instance) -> Result<Instance> {
        debug!("Updating instance");
        let response = self
            .http
            .put(self.url(&format!("/api/instances/{}", id)))
            .json(instance)
            .send()
            .await?;
        Self::decode(response, || DatastoreError::InstanceNotFound(format!("id={}", id))).await
    }

    /// Delete an instance by id.
    #[instrument(skip(self))]
    pub async fn delete_instance(&self, id: i64) -> Result<()> {
        debug!("Deleting instance");
        let response = self
            .http
            .delete(self.url(&format!("/api/instances/{}", id)))
            .send()
            .await?;
        Self::check_status(response, || DatastoreError::InstanceNotFound(format!("id={}", id)))
            .await?;
        Ok(())
    }

    /// Read-modify-write an instance's status.
    ///
    /// Fetches the current record, sets `status`, and PUTs it back. The
    /// two steps are not atomic; this is used only by the post-success
    /// write-back path, where the persisted status is a lagging mirror of
    /// the compute backend anyway.
    #[instrument(skip(self))]
    pub async fn update_instance_status(&self, id: i64, status: InstanceStatus) -> Result<Instance> {
        debug!(%status, "Updating instance status");
        let mut instance = self.get_instance(id).await?;
        instance.status = status;
        self.update_instance(id, &instance).await
    }

    // =========================================================================
    // Live environments
    // =========================================================================

    /// Fetch the live environment for a user, if one exists.
    ///
    /// Absence is an expected state (rows are provisioned out-of-band),
    /// so a remote 404 maps to `Ok(None)` rather than an error.
    #[instrument(skip(self))]
    pub async fn live_environment_by_user(&self, user_id: i64) -> Result<Option<LiveEnvironment>> {
        debug!("Fetching live environment for user");
        let response = self
            .http
            .get(self.url(&format!("/api/live-environments/{}", user_id)))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        Self::decode(response, || DatastoreError::LiveEnvironmentNotFound(user_id))
            .await
            .map(Some)
    }

    /// Update a live environment's status field.
    #[instrument(skip(self))]
    pub async fn update_live_environment_status(&self, id: i64, status: &str) -> Result<()> {
        debug!(%status, "Updating live environment status");
        let response = self
            .http
            .put(self.url(&format!("/api/live-environments/{}", id)))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        Self::check_status(response, || DatastoreError::LiveEnvironmentNotFound(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> DatastoreClient {
        DatastoreClient::new(DatastoreConfig::new().with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn get_user_decodes_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1, "name": "alice", "email": "alice@example.com"
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).await.get_user(1).await.unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn remote_404_maps_to_not_found_not_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).await.get_image(42).await.unwrap_err();
        assert!(matches!(err, DatastoreError::ImageNotFound(42)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remote_409_maps_to_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/images"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate imageRef"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .create_image(&NewImage {
                image_ref: "ubuntu:24.04".to_string(),
                name: "ubuntu".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatastoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn connection_failure_maps_to_unavailable() {
        // Nothing listens on this port.
        let client = DatastoreClient::new(
            DatastoreConfig::new()
                .with_base_url("http://127.0.0.1:1")
                .with_request_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = client.get_user(1).await.unwrap_err();
        assert!(matches!(err, DatastoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn timeout_is_treated_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 1, "name": "a", "email": "a@b"}))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;

        let client = DatastoreClient::new(
            DatastoreConfig::new()
                .with_base_url(server.uri())
                .with_request_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = client.get_user(1).await.unwrap_err();
        assert!(matches!(err, DatastoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn instances_by_user_and_image_filters_client_side() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/instances/user/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 10, "containerId": "c1", "name": "a_x", "userId": 1, "imageId": 7, "status": "running"},
                {"id": 11, "containerId": "c2", "name": "a_y", "userId": 1, "imageId": 8, "status": "stopped"},
                {"id": 12, "containerId": "c3", "name": "a_z", "userId": 1, "imageId": 7, "status": "created"}
            ])))
            .mount(&server)
            .await;

        let matching = client_for(&server)
            .await
            .instances_by_user_and_image(1, 7)
            .await
            .unwrap();
        assert_eq!(matching.len(), 2);
        assert!(matching.iter().all(|i| i.image_id == 7));
        // Source order is preserved; the first result is the canonical one.
        assert_eq!(matching[0].id, 10);
    }

    #[tokio::test]
    async fn live_environment_404_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/live-environments/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let live = client_for(&server)
            .await
            .live_environment_by_user(9)
            .await
            .unwrap();
        assert!(live.is_none());
    }

    #[tokio::test]
    async fn update_instance_status_reads_then_writes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/instances/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 10, "containerId": "c1", "name": "a_x",
                "userId": 1, "imageId": 7, "status": "created"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/instances/10"))
            .and(body_partial_json(
                serde_json::json!({"status": "running", "containerId": "c1"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 10, "containerId": "c1", "name": "a_x",
                "userId": 1, "imageId": 7, "status": "running"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updated = client_for(&server)
            .await
            .update_instance_status(10, InstanceStatus::Running)
            .await
            .unwrap();
        assert_eq!(updated.status, InstanceStatus::Running);
        // container_id is owned by the compute backend and passes through
        // the read-modify-write untouched.
        assert_eq!(updated.container_id, "c1");
    }

    #[tokio::test]
    async fn create_instance_sends_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/instances"))
            .and(body_partial_json(serde_json::json!({
                "containerId": "", "name": "alice_ubuntu",
                "userId": 1, "imageId": 7, "status": "created"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 99, "containerId": "", "name": "alice_ubuntu",
                "userId": 1, "imageId": 7, "status": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .await
            .create_instance(&NewInstance {
                container_id: String::new(),
                name: "alice_ubuntu".to_string(),
                user_id: 1,
                image_id: 7,
                status: InstanceStatus::Created,
                user: None,
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 99);
    }

    #[tokio::test]
    async fn update_live_environment_status_puts_status_only() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/live-environments/3"))
            .and(body_partial_json(serde_json::json!({"status": "running"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .await
            .update_live_environment_status(3, "running")
            .await
            .unwrap();
    }
}
