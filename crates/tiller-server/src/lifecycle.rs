// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lifecycle orchestration over the datastore and compute gateways.
//!
//! Every operation here is a short chain of sequential remote calls with
//! no shared transaction: resolve the persisted record, build a hydrated
//! backend request, invoke the compute backend, then mirror the resulting
//! status back to the datastore. The compute backend is the source of
//! truth for operation outcomes; the persisted status is a lagging mirror
//! updated by a fire-and-forget task whose failures are logged, never
//! propagated.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use tiller_compute::{
    ComputeClient, ImageSyncRequest, InstanceOpRequest, LiveResetRequest, LiveStartRequest,
    LiveStopRequest,
};
use tiller_datastore::{
    DatastoreClient, Image, Instance, InstanceStatus, NewImage, NewInstance, User,
};

use crate::error::{LifecycleError, Result};

/// Pre-existence policy for instance operations.
///
/// The two HTTP front doors disagree on whether an operation may create
/// the instance it targets, so the policy is an explicit parameter rather
/// than an implicit per-call-site behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfMissing {
    /// Find-or-create: absent instances are created before the operation.
    Create,
    /// Require pre-existence: absent instances fail the operation.
    Reject,
}

/// Instance verb sent to the compute backend.
#[derive(Debug, Clone, Copy)]
enum InstanceVerb {
    Start,
    Stop,
    Reset,
}

impl InstanceVerb {
    /// Status the persisted record should mirror after backend success.
    /// Reset drives to `stopped` regardless of source state.
    fn target_status(self) -> InstanceStatus {
        match self {
            InstanceVerb::Start => InstanceStatus::Running,
            InstanceVerb::Stop | InstanceVerb::Reset => InstanceStatus::Stopped,
        }
    }
}

/// Outcome of an instance operation: the backend's raw acknowledgement
/// plus the instance the operation ran against.
#[derive(Debug, Clone)]
pub struct InstanceOperation {
    /// Raw acknowledgement from the compute backend.
    pub message: String,
    /// The resolved (possibly just-created) instance.
    pub instance: Instance,
}

/// Outcome of registering an image.
#[derive(Debug, Clone)]
pub struct ImageRegistration {
    /// Raw acknowledgement from the compute backend.
    pub message: String,
    /// The persisted image record.
    pub image: Image,
}

/// The lifecycle orchestrator.
///
/// Holds the two gateway clients (injected at construction) and the
/// single-flight creation locks. Cheap to share behind an `Arc`; all
/// state is per-request apart from the lock table.
pub struct Lifecycle {
    datastore: Arc<DatastoreClient>,
    compute: Arc<ComputeClient>,
    /// Single-flight locks keyed by (user_id, image_id). Serializes
    /// concurrent find-or-create for the same pair within this process;
    /// duplicates across processes remain possible because the store has
    /// no uniqueness constraint.
    creation_locks: DashMap<(i64, i64), Arc<Mutex<()>>>,
}

impl Lifecycle {
    /// Create an orchestrator over the given gateway clients.
    pub fn new(datastore: Arc<DatastoreClient>, compute: Arc<ComputeClient>) -> Self {
        Self {
            datastore,
            compute,
            creation_locks: DashMap::new(),
        }
    }

    // =========================================================================
    // Instance resolution
    // =========================================================================

    /// Return the existing instance for (user, image), or create one.
    ///
    /// When several instances exist for the pair the first in source
    /// order is returned; the uniqueness invariant says this should not
    /// happen, and no tie-break is invented that would hide violations.
    /// Creation fetches the user and image records sequentially (no
    /// compensating rollback if the second read fails) and persists a new
    /// instance with status `created`, an empty container id, and the
    /// name `<userName>_<imageName>`.
    #[instrument(skip(self))]
    pub async fn find_or_create_instance(&self, user_id: i64, image_id: i64) -> Result<Instance> {
        let lock = self
            .creation_locks
            .entry((user_id, image_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let existing = self
            .datastore
            .instances_by_user_and_image(user_id, image_id)
            .await?;
        if let Some(instance) = existing.into_iter().next() {
            info!(instance_id = instance.id, "Found existing instance");
            return Ok(instance);
        }

        info!("No existing instance, creating one");
        let user = self.datastore.get_user(user_id).await?;
        let image = self.datastore.get_image(image_id).await?;

        let new_instance = NewInstance {
            container_id: String::new(),
            name: format!("{}_{}", user.name, image.name),
            user_id,
            image_id,
            status: InstanceStatus::Created,
            user: Some(user),
            image: Some(image),
        };
        let created = self.datastore.create_instance(&new_instance).await?;
        info!(instance_id = created.id, name = %created.name, "Instance created");
        Ok(created)
    }

    /// Resolve the instance for (user, image) under the given policy.
    async fn resolve_instance(
        &self,
        user_id: i64,
        image_id: i64,
        if_missing: IfMissing,
    ) -> Result<Instance> {
        match if_missing {
            IfMissing::Create => self.find_or_create_instance(user_id, image_id).await,
            IfMissing::Reject => {
                let existing = self
                    .datastore
                    .instances_by_user_and_image(user_id, image_id)
                    .await?;
                existing
                    .into_iter()
                    .next()
                    .ok_or(LifecycleError::InstanceMissing { user_id, image_id })
            }
        }
    }

    // =========================================================================
    // Instance operations
    // =========================================================================

    /// Start an instance.
    #[instrument(skip(self))]
    pub async fn start_instance(
        &self,
        user_id: i64,
        image_id: i64,
        if_missing: IfMissing,
    ) -> Result<InstanceOperation> {
        self.instance_op(user_id, image_id, if_missing, InstanceVerb::Start)
            .await
    }

    /// Stop an instance.
    #[instrument(skip(self))]
    pub async fn stop_instance(
        &self,
        user_id: i64,
        image_id: i64,
        if_missing: IfMissing,
    ) -> Result<InstanceOperation> {
        self.instance_op(user_id, image_id, if_missing, InstanceVerb::Stop)
            .await
    }

    /// Reset an instance (stop and start fresh on the backend side).
    #[instrument(skip(self))]
    pub async fn reset_instance(
        &self,
        user_id: i64,
        image_id: i64,
        if_missing: IfMissing,
    ) -> Result<InstanceOperation> {
        self.instance_op(user_id, image_id, if_missing, InstanceVerb::Reset)
            .await
    }

    /// Shared shape of the three instance verbs: resolve, hydrate,
    /// invoke, then mirror the target status back best-effort.
    async fn instance_op(
        &self,
        user_id: i64,
        image_id: i64,
        if_missing: IfMissing,
        verb: InstanceVerb,
    ) -> Result<InstanceOperation> {
        let instance = self.resolve_instance(user_id, image_id, if_missing).await?;
        let request = hydrated_request(&instance);

        info!(
            instance_id = instance.id,
            ?verb,
            "Sending instance operation to compute backend"
        );
        let message = match verb {
            InstanceVerb::Start => self.compute.start_instance(&request).await?,
            InstanceVerb::Stop => self.compute.stop_instance(&request).await?,
            InstanceVerb::Reset => self.compute.reset_instance(&request).await?,
        };

        // The backend operation succeeded; the response no longer depends
        // on the datastore. The status mirror happens off the request path.
        self.spawn_instance_status_update(instance.id, verb.target_status());

        Ok(InstanceOperation { message, instance })
    }

    /// Fire-and-forget status write-back for an instance.
    fn spawn_instance_status_update(&self, instance_id: i64, status: InstanceStatus) {
        let datastore = Arc::clone(&self.datastore);
        tokio::spawn(async move {
            match datastore.update_instance_status(instance_id, status).await {
                Ok(_) => info!(instance_id, %status, "Instance status updated"),
                Err(err) => error!(
                    instance_id,
                    %status,
                    error = %err,
                    "Failed to update instance status after backend success"
                ),
            }
        });
    }

    // =========================================================================
    // Live environment operations
    // =========================================================================

    /// Start a user's live environment session.
    ///
    /// Keyed by user alone; there is no find-or-create for live
    /// environments. A missing row is tolerated: the backend request then
    /// carries only the user data, and no status write-back is attempted.
    #[instrument(skip(self))]
    pub async fn start_live_environment(&self, user_id: i64) -> Result<String> {
        let live = self.datastore.live_environment_by_user(user_id).await?;
        if live.is_none() {
            warn!("No live environment row for user, sending what we have");
        }
        let user = self.datastore.get_user(user_id).await?;

        let request = live_start_request(user_id, live.as_ref(), &user);
        let message = self.compute.start_live_environment(&request).await?;

        if let Some(live) = live {
            self.spawn_live_status_update(live.id, "running");
        }
        Ok(message)
    }

    /// Stop a user's live environment session.
    #[instrument(skip(self))]
    pub async fn stop_live_environment(&self, user_id: i64) -> Result<String> {
        let live = self.datastore.live_environment_by_user(user_id).await?;

        let request = LiveStopRequest {
            user_id,
            live_env_id: live.as_ref().map(|l| l.id),
            docker_container_id: live.as_ref().and_then(|l| l.docker_container_id.clone()),
        };
        let message = self.compute.stop_live_environment(&request).await?;

        if let Some(live) = live {
            self.spawn_live_status_update(live.id, "stopped");
        }
        Ok(message)
    }

    /// Reset a user's live environment session. Drives to `stopped`.
    #[instrument(skip(self))]
    pub async fn reset_live_environment(&self, user_id: i64) -> Result<String> {
        let live = self.datastore.live_environment_by_user(user_id).await?;

        let request = LiveResetRequest {
            user_id,
            live_env_id: live.as_ref().map(|l| l.id),
            docker_container_id: live.as_ref().and_then(|l| l.docker_container_id.clone()),
            docker_image: live.as_ref().and_then(|l| l.docker_image.clone()),
        };
        let message = self.compute.reset_live_environment(&request).await?;

        if let Some(live) = live {
            self.spawn_live_status_update(live.id, "stopped");
        }
        Ok(message)
    }

    /// Fire-and-forget status write-back for a live environment.
    fn spawn_live_status_update(&self, live_env_id: i64, status: &'static str) {
        let datastore = Arc::clone(&self.datastore);
        tokio::spawn(async move {
            match datastore
                .update_live_environment_status(live_env_id, status)
                .await
            {
                Ok(()) => info!(live_env_id, status, "Live environment status updated"),
                Err(err) => error!(
                    live_env_id,
                    status,
                    error = %err,
                    "Failed to update live environment status after backend success"
                ),
            }
        });
    }

    // =========================================================================
    // Image operations
    // =========================================================================

    /// Register a new image: persist first, then tell the compute backend.
    ///
    /// The two phases share no transaction. If the backend registration
    /// fails after the datastore write, the persisted record is retained
    /// (orphaned from the backend's view) and the error surfaces; a retry
    /// re-invokes this method and persists a second record. Known gap.
    #[instrument(skip(self))]
    pub async fn add_image(&self, image_ref: &str, name: &str) -> Result<ImageRegistration> {
        let saved = self
            .datastore
            .create_image(&NewImage {
                image_ref: image_ref.to_string(),
                name: name.to_string(),
            })
            .await?;
        info!(image_id = saved.id, "Image persisted, registering with compute backend");

        let message = self
            .compute
            .add_image(&ImageSyncRequest {
                id: saved.id,
                image_ref: saved.image_ref.clone(),
                name: saved.name.clone(),
            })
            .await?;

        Ok(ImageRegistration {
            message,
            image: saved,
        })
    }

    /// Remove an image: fetch, deregister from the backend, then delete.
    ///
    /// An unknown id fails before the compute backend is contacted. If
    /// the datastore delete fails after a successful deregistration the
    /// error surfaces and the record is retained, now orphaned from the
    /// backend's view. Mirror gap of [`Lifecycle::add_image`].
    #[instrument(skip(self))]
    pub async fn remove_image(&self, image_id: i64) -> Result<String> {
        let image = self.datastore.get_image(image_id).await?;

        let message = self
            .compute
            .remove_image(&ImageSyncRequest {
                id: image.id,
                image_ref: image.image_ref.clone(),
                name: image.name.clone(),
            })
            .await?;

        self.datastore.delete_image(image_id).await?;
        info!(image_id, "Image removed");
        Ok(message)
    }

    // =========================================================================
    // Read passthroughs
    // =========================================================================

    /// List all images from the datastore.
    pub async fn list_images(&self) -> Result<Vec<Image>> {
        Ok(self.datastore.list_images().await?)
    }

    /// List all instances from the datastore.
    pub async fn list_instances(&self) -> Result<Vec<Instance>> {
        Ok(self.datastore.list_instances().await?)
    }
}

/// Flatten an instance and its hydrated user/image records into the
/// backend request. Every available field is forwarded; the backend
/// prefers a complete picture over a minimal payload.
fn hydrated_request(instance: &Instance) -> InstanceOpRequest {
    InstanceOpRequest {
        id: instance.id,
        container_id: instance.container_id.clone(),
        name: instance.name.clone(),
        user_id: instance.user_id,
        image_id: instance.image_id,
        status: instance.status.to_string(),
        image_ref: instance.image.as_ref().map(|i| i.image_ref.clone()),
        image_name: instance.image.as_ref().map(|i| i.name.clone()),
        user_name: instance.user.as_ref().map(|u| u.name.clone()),
        user_email: instance.user.as_ref().map(|u| u.email.clone()),
    }
}

fn live_start_request(
    user_id: i64,
    live: Option<&tiller_datastore::LiveEnvironment>,
    user: &User,
) -> LiveStartRequest {
    LiveStartRequest {
        user_id,
        live_env_id: live.map(|l| l.id),
        docker_container_id: live.and_then(|l| l.docker_container_id.clone()),
        docker_image: live.and_then(|l| l.docker_image.clone()),
        vnc_host: live.and_then(|l| l.vnc_host.clone()),
        vnc_port: live.and_then(|l| l.vnc_port),
        vnc_password: live.and_then(|l| l.vnc_password.clone()),
        status: live.and_then(|l| l.status.clone()),
        user_name: Some(user.name.clone()),
        user_email: Some(user.email.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_targets_stopped_regardless_of_source_state() {
        assert_eq!(InstanceVerb::Reset.target_status(), InstanceStatus::Stopped);
        assert_eq!(InstanceVerb::Start.target_status(), InstanceStatus::Running);
        assert_eq!(InstanceVerb::Stop.target_status(), InstanceStatus::Stopped);
    }

    #[test]
    fn hydrated_request_forwards_all_available_fields() {
        let instance = Instance {
            id: 5,
            container_id: "c1".to_string(),
            name: "alice_ubuntu".to_string(),
            user_id: 1,
            image_id: 7,
            status: InstanceStatus::Created,
            user: Some(User {
                id: 1,
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: None,
            }),
            image: Some(Image {
                id: 7,
                image_ref: "ubuntu:24.04".to_string(),
                name: "ubuntu".to_string(),
            }),
        };

        let request = hydrated_request(&instance);
        assert_eq!(request.status, "created");
        assert_eq!(request.image_ref.as_deref(), Some("ubuntu:24.04"));
        assert_eq!(request.user_email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn hydrated_request_tolerates_unhydrated_instance() {
        let instance = Instance {
            id: 5,
            container_id: String::new(),
            name: "a_b".to_string(),
            user_id: 1,
            image_id: 7,
            status: InstanceStatus::Stopped,
            user: None,
            image: None,
        };

        let request = hydrated_request(&instance);
        assert!(request.image_ref.is_none());
        assert!(request.user_name.is_none());
    }
}
