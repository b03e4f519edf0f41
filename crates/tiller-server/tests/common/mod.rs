// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared test harness: mock datastore + compute servers wired into a
//! real orchestrator.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::MockServer;

use tiller_compute::{ComputeClient, ComputeConfig};
use tiller_datastore::{DatastoreClient, DatastoreConfig};
use tiller_server::{AppState, Lifecycle};

pub struct TestHarness {
    pub datastore: MockServer,
    pub compute: MockServer,
    pub lifecycle: Arc<Lifecycle>,
}

pub async fn harness() -> TestHarness {
    let datastore = MockServer::start().await;
    let compute = MockServer::start().await;

    let datastore_client = Arc::new(
        DatastoreClient::new(
            DatastoreConfig::new()
                .with_base_url(datastore.uri())
                .with_request_timeout(Duration::from_secs(2)),
        )
        .expect("datastore client"),
    );
    let compute_client = Arc::new(
        ComputeClient::new(
            ComputeConfig::new()
                .with_base_url(compute.uri())
                .with_request_timeout(Duration::from_secs(2)),
        )
        .expect("compute client"),
    );

    let lifecycle = Arc::new(Lifecycle::new(datastore_client, compute_client));

    TestHarness {
        datastore,
        compute,
        lifecycle,
    }
}

impl TestHarness {
    /// Build the full application router over this harness's orchestrator.
    pub fn app(&self) -> axum::Router {
        tiller_server::routes::router(AppState::new(Arc::clone(&self.lifecycle)))
    }

    /// Wait until the datastore mock has seen a request matching
    /// (method, path), or give up after ~2 seconds. Used to observe the
    /// fire-and-forget status write-back without racing it.
    pub async fn datastore_saw(&self, method: &str, path: &str) -> bool {
        saw_request(&self.datastore, method, path).await
    }

    /// Number of requests the datastore mock has received for (method, path).
    pub async fn datastore_request_count(&self, method: &str, path: &str) -> usize {
        request_count(&self.datastore, method, path).await
    }

    /// Number of requests the compute mock has received, any endpoint.
    pub async fn compute_request_count(&self) -> usize {
        self.compute
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

async fn request_count(server: &MockServer, method: &str, path: &str) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| {
            requests
                .iter()
                .filter(|r| r.method.as_str() == method && r.url.path() == path)
                .count()
        })
        .unwrap_or(0)
}

async fn saw_request(server: &MockServer, method: &str, path: &str) -> bool {
    for _ in 0..40 {
        if request_count(server, method, path).await > 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

// =============================================================================
// Record fixtures
// =============================================================================

pub fn user_json(id: i64, name: &str, email: &str) -> serde_json::Value {
    serde_json::json!({"id": id, "name": name, "email": email})
}

pub fn image_json(id: i64, image_ref: &str, name: &str) -> serde_json::Value {
    serde_json::json!({"id": id, "imageRef": image_ref, "name": name})
}

pub fn instance_json(
    id: i64,
    container_id: &str,
    name: &str,
    user_id: i64,
    image_id: i64,
    status: &str,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "containerId": container_id,
        "name": name,
        "userId": user_id,
        "imageId": image_id,
        "status": status,
        "user": user_json(user_id, "alice", "alice@example.com"),
        "image": image_json(image_id, "ubuntu:24.04", "ubuntu"),
    })
}
