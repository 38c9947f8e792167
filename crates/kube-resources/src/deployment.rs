//! Deployment rollout tracking
//!
//! A Deployment has rolled out once the controller has observed the latest
//! generation and every desired replica is updated and available, with no old
//! replicas left over. It has failed once the controller gives up progressing.

use crate::common::{WatchedObject, find_named, list_cached};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment as K8sDeployment;
use kube::{Api, Client};
use rollout_watcher::{Resource, SyncCache};
use std::time::Duration;
use tracing::warn;

pub const KIND: &str = "Deployment";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const PROGRESS_DEADLINE_EXCEEDED: &str = "ProgressDeadlineExceeded";

/// A Deployment watched until its rollout completes or stalls.
pub struct Deployment {
    object: WatchedObject,
    api: Api<K8sDeployment>,
    instance: Option<K8sDeployment>,
    last_error: Option<String>,
}

impl Deployment {
    /// Watch the Deployment called `name` in `namespace` with the default timeout
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            object: WatchedObject::new(KIND, namespace, name, DEFAULT_TIMEOUT),
            api: Api::namespaced(client, namespace),
            instance: None,
            last_error: None,
        }
    }

    /// Override the per-resource timeout, counted from the first sync
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.object.set_timeout(timeout);
        self
    }

    /// Last observed state, if the Deployment was found
    pub fn instance(&self) -> Option<&K8sDeployment> {
        self.instance.as_ref()
    }
}

#[async_trait]
impl Resource for Deployment {
    fn name(&self) -> &str {
        self.object.name()
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn id(&self) -> String {
        self.object.id()
    }

    fn timeout(&self) -> Duration {
        self.object.timeout()
    }

    async fn sync(&mut self, cache: &mut SyncCache) {
        self.object.mark_synced();

        match list_cached(&self.api, cache, self.object.namespace()).await {
            Ok(items) => {
                self.instance = find_named(&items, self.object.name());
                self.last_error = None;
            }
            Err(e) => {
                warn!("Failed to list Deployments in namespace {}: {}", self.object.namespace(), e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn deploy_succeeded(&self) -> bool {
        self.instance.as_ref().is_some_and(rollout_complete)
    }

    fn deploy_failed(&self) -> bool {
        self.instance.as_ref().is_some_and(progress_deadline_exceeded)
    }

    fn deploy_timed_out(&self) -> bool {
        self.object.timed_out()
    }

    fn debug_message(&self) -> Option<String> {
        let mut lines = vec![self.pretty_status()];

        if let Some(status) = self.instance.as_ref().and_then(|d| d.status.as_ref()) {
            for condition in status.conditions.iter().flatten() {
                lines.push(format!(
                    "  {}={} ({}): {}",
                    condition.type_,
                    condition.status,
                    condition.reason.as_deref().unwrap_or("-"),
                    condition.message.as_deref().unwrap_or("")
                ));
            }
        }

        if let Some(error) = &self.last_error {
            lines.push(format!("  Last sync error: {error}"));
        }

        Some(lines.join("\n"))
    }

    fn pretty_status(&self) -> String {
        let status = match &self.instance {
            Some(deployment) => status_line(deployment),
            None => format!("Not found in namespace {}", self.object.namespace()),
        };
        self.object.pretty_status(&status)
    }
}

fn desired_replicas(deployment: &K8sDeployment) -> i32 {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1)
}

/// Latest generation observed and all replicas updated, available, and nothing stale
pub fn rollout_complete(deployment: &K8sDeployment) -> bool {
    let Some(status) = &deployment.status else {
        return false;
    };

    let desired = desired_replicas(deployment);
    let generation = deployment.metadata.generation.unwrap_or(0);
    let observed = status.observed_generation.unwrap_or(0);

    observed >= generation
        && status.updated_replicas.unwrap_or(0) == desired
        && status.available_replicas.unwrap_or(0) >= desired
        && status.replicas.unwrap_or(0) == desired
}

/// The Progressing condition reports the deadline was exceeded
pub fn progress_deadline_exceeded(deployment: &K8sDeployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions.iter().any(|condition| {
                condition.type_ == "Progressing"
                    && condition.status == "False"
                    && condition.reason.as_deref() == Some(PROGRESS_DEADLINE_EXCEEDED)
            })
        })
}

fn status_line(deployment: &K8sDeployment) -> String {
    let desired = desired_replicas(deployment);
    let status = deployment.status.clone().unwrap_or_default();

    format!(
        "{}/{} updated, {}/{} available, {} total",
        status.updated_replicas.unwrap_or(0),
        desired,
        status.available_replicas.unwrap_or(0),
        desired,
        status.replicas.unwrap_or(0)
    )
}
