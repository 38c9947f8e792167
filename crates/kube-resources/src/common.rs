//! Shared plumbing for kube-backed resources
//!
//! Provides the identity/timeout bookkeeping every kind carries and the cached
//! namespace-wide list call all kinds read through.

use kube::api::ListParams;
use kube::{Api, Resource as KubeResource};
use rollout_watcher::{CacheKey, SyncCache};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identity and timing of one watched object.
#[derive(Debug, Clone)]
pub struct WatchedObject {
    kind: &'static str,
    name: String,
    namespace: String,
    timeout: Duration,
    first_synced: Option<Instant>,
}

impl WatchedObject {
    pub fn new(kind: &'static str, namespace: &str, name: &str, timeout: Duration) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
            timeout,
            first_synced: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// `Kind/name`
    pub fn id(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Start the resource's own timeout clock on the first sync
    pub fn mark_synced(&mut self) {
        if self.first_synced.is_none() {
            self.first_synced = Some(Instant::now());
        }
    }

    /// True once more than `timeout` has passed since the first sync
    pub fn timed_out(&self) -> bool {
        self.first_synced
            .is_some_and(|first_synced| first_synced.elapsed() > self.timeout)
    }

    /// `Kind/name  status`
    pub fn pretty_status(&self, status: &str) -> String {
        format!("{}  {}", self.id(), status)
    }
}

/// List every object of kind `K` in `namespace`, at most once per pass.
pub async fn list_cached<K>(api: &Api<K>, cache: &mut SyncCache, namespace: &str) -> Result<Arc<Vec<K>>, kube::Error>
where
    K: KubeResource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
{
    let key = CacheKey::namespaced(K::kind(&()), namespace);
    let api = api.clone();

    cache
        .get_or_try_fetch(key, || async move {
            debug!("Listing {} in namespace {}", K::kind(&()), namespace);
            let list = api.list(&ListParams::default()).await?;
            Ok(list.items)
        })
        .await
}

/// The object called `name` in a listed set
pub fn find_named<K>(items: &[K], name: &str) -> Option<K>
where
    K: KubeResource + Clone,
{
    items
        .iter()
        .find(|item| item.meta().name.as_deref() == Some(name))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("test".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_find_named() {
        let pods = vec![pod("web-0"), pod("web-1")];

        assert_eq!(find_named(&pods, "web-1").and_then(|p| p.metadata.name), Some("web-1".to_string()));
        assert!(find_named(&pods, "web-2").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watched_object_times_out_after_first_sync() {
        let mut object = WatchedObject::new("Pod", "test", "web-0", Duration::from_secs(60));
        assert!(!object.timed_out());

        object.mark_synced();
        tokio::time::advance(Duration::from_secs(30)).await;
        object.mark_synced();
        assert!(!object.timed_out());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(object.timed_out());
        assert_eq!(object.id(), "Pod/web-0");
        assert_eq!(object.pretty_status("Running"), "Pod/web-0  Running");
    }
}
