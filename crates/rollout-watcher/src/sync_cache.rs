//! Per-pass read cache
//!
//! A [`SyncCache`] lives for exactly one polling pass. Resources sharing a
//! namespace or a parent object ask it for the same read, and only the first
//! one reaches the cluster. Cluster state moves between passes, so the watcher
//! drops the cache at the end of every pass and starts the next one empty.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Opaque lookup key for a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: String,
    namespace: Option<String>,
    selector: Option<String>,
}

impl CacheKey {
    /// Key for a cluster-scoped read of `kind`
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            selector: None,
        }
    }

    /// Key for a read of `kind` in one namespace
    pub fn namespaced(kind: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: Some(namespace.into()),
            selector: None,
        }
    }

    /// Narrow the key to a label or field selector
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        if let Some(namespace) = &self.namespace {
            write!(f, "/{namespace}")?;
        }
        if let Some(selector) = &self.selector {
            write!(f, "?{selector}")?;
        }
        Ok(())
    }
}

/// Hit/miss counters for [`SyncCache::get_or_try_fetch`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Type-erased key/value store scoped to one polling pass.
///
/// Values are stored behind an `Arc` and retrieved by type. Asking for a key
/// under a different type than the one stored is a miss.
#[derive(Default)]
pub struct SyncCache {
    entries: HashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
    stats: CacheStats,
}

impl SyncCache {
    /// An empty cache for one pass
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously stored value for `key`, if it has type `T`
    pub fn get<T>(&self, key: &CacheKey) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self.entries.get(key)?;
        Arc::clone(entry).downcast::<T>().ok()
    }

    /// Store `value` under `key`, replacing whatever was there
    pub fn insert<T>(&mut self, key: CacheKey, value: T) -> Arc<T>
    where
        T: Any + Send + Sync,
    {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value) as Arc<dyn Any + Send + Sync>);
        value
    }

    /// True when anything is stored under `key`, whatever its type
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached `T` for `key`, or await `fetch` and cache its result.
    ///
    /// A failed fetch is returned to the caller and nothing is cached, so the
    /// next resource asking for the same key within the pass tries again.
    pub async fn get_or_try_fetch<T, E, F, Fut>(&mut self, key: CacheKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.stats.hits += 1;
            return Ok(value);
        }

        self.stats.misses += 1;
        let value = fetch().await?;
        Ok(self.insert(key, value))
    }

    /// Hits and misses seen by [`SyncCache::get_or_try_fetch`] so far
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl fmt::Debug for SyncCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn test_cache_key_display() {
        assert_eq!(CacheKey::new("Node").to_string(), "Node");
        assert_eq!(CacheKey::namespaced("Pod", "test").to_string(), "Pod/test");
        assert_eq!(
            CacheKey::namespaced("Pod", "test").with_selector("app=web").to_string(),
            "Pod/test?app=web"
        );
    }

    #[test]
    fn test_get_is_typed() {
        let mut cache = SyncCache::new();
        let key = CacheKey::namespaced("Deployment", "test");
        cache.insert(key.clone(), vec!["web".to_string()]);

        assert_eq!(cache.get::<Vec<String>>(&key).as_deref(), Some(&vec!["web".to_string()]));
        assert!(cache.get::<u32>(&key).is_none());
        assert!(cache.get::<Vec<String>>(&CacheKey::namespaced("Deployment", "other")).is_none());
        assert!(cache.contains(&key));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_try_fetch_dedups_reads() {
        let mut cache = SyncCache::new();
        let key = CacheKey::namespaced("Pod", "test");
        let mut fetches = 0;

        for _ in 0..3 {
            let pods = cache
                .get_or_try_fetch(key.clone(), || {
                    fetches += 1;
                    async { Ok::<_, Infallible>(vec!["web-1", "web-2"]) }
                })
                .await
                .unwrap();
            assert_eq!(pods.len(), 2);
        }

        assert_eq!(fetches, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut cache = SyncCache::new();
        let key = CacheKey::namespaced("Pod", "test");

        let first: Result<Arc<u32>, &str> = cache.get_or_try_fetch(key.clone(), || async { Err("connection reset") }).await;
        assert_eq!(first.unwrap_err(), "connection reset");
        assert!(cache.is_empty());

        let second: Result<Arc<u32>, &str> = cache.get_or_try_fetch(key.clone(), || async { Ok(7) }).await;
        assert_eq!(*second.unwrap(), 7);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }
}
