//! Pod readiness tracking

use crate::common::{WatchedObject, find_named, list_cached};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerStatus, Pod as K8sPod};
use kube::{Api, Client};
use rollout_watcher::{Resource, SyncCache};
use std::time::Duration;
use tracing::warn;

pub const KIND: &str = "Pod";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Waiting reasons a container does not recover from without intervention
const FAILURE_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "CreateContainerConfigError",
];

/// A Pod watched until it is ready, completed, or stuck.
pub struct Pod {
    object: WatchedObject,
    api: Api<K8sPod>,
    instance: Option<K8sPod>,
    last_error: Option<String>,
}

impl Pod {
    /// Watch the Pod called `name` in `namespace` with the default timeout
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

    /// Last observed state, if the Pod was found
    pub fn instance(&self) -> Option<&K8sPod> {
        self.instance.as_ref()
    }
}

#[async_trait]
impl Resource for Pod {
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
                warn!("Failed to list Pods in namespace {}: {}", self.object.namespace(), e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn deploy_succeeded(&self) -> bool {
        self.instance.as_ref().is_some_and(pod_ready)
    }

    fn deploy_failed(&self) -> bool {
        self.instance.as_ref().is_some_and(pod_failed)
    }

    fn deploy_timed_out(&self) -> bool {
        self.object.timed_out()
    }

    fn debug_message(&self) -> Option<String> {
        let mut lines = vec![self.pretty_status()];

        if let Some(pod) = &self.instance {
            for container in container_statuses(pod) {
                if let Some(waiting) = container.state.as_ref().and_then(|s| s.waiting.as_ref()) {
                    lines.push(format!(
                        "  container {}: {}: {}",
                        container.name,
                        waiting.reason.as_deref().unwrap_or("Waiting"),
                        waiting.message.as_deref().unwrap_or("")
                    ));
                }
            }
        }

        if let Some(error) = &self.last_error {
            lines.push(format!("  Last sync error: {error}"));
        }

        Some(lines.join("\n"))
    }

    fn pretty_status(&self) -> String {
        let status = match &self.instance {
            Some(pod) if pod_ready(pod) => format!("{} (ready)", phase(pod)),
            Some(pod) => phase(pod).to_string(),
            None => format!("Not found in namespace {}", self.object.namespace()),
        };
        self.object.pretty_status(&status)
    }
}

fn phase(pod: &K8sPod) -> &str {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .unwrap_or("Unknown")
}

fn container_statuses(pod: &K8sPod) -> impl Iterator<Item = &ContainerStatus> {
    pod.status.iter().flat_map(|status| {
        status
            .init_container_statuses
            .iter()
            .flatten()
            .chain(status.container_statuses.iter().flatten())
    })
}

/// Completed, or running with the Ready condition true
pub fn pod_ready(pod: &K8sPod) -> bool {
    match phase(pod) {
        "Succeeded" => true,
        "Running" => pod
            .status
            .as_ref()
            .and_then(|status| status.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            }),
        _ => false,
    }
}

/// Failed phase, or any container stuck waiting on an unrecoverable reason
pub fn pod_failed(pod: &K8sPod) -> bool {
    if phase(pod) == "Failed" {
        return true;
    }

    container_statuses(pod).any(|container| {
        container
            .state
            .as_ref()
            .and_then(|state| state.waiting.as_ref())
            .and_then(|waiting| waiting.reason.as_deref())
            .is_some_and(|reason| FAILURE_REASONS.contains(&reason))
    })
}
