//! Test doubles for the watcher
//!
//! Scripted resources and capturing sinks that can be used in unit tests
//! without a cluster. Enabled by the `test-util` feature.

use crate::metrics::MetricsSink;
use crate::progress::ProgressSink;
use crate::resource::Resource;
use crate::summary::DeploySummary;
use crate::sync_cache::{CacheKey, SyncCache};
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Final status a [`MockResource`] reports once it has been synced enough times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStatus {
    Success,
    Failed,
    Timeout,
}

impl fmt::Display for MockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        })
    }
}

/// Resource that becomes terminal after a fixed number of syncs.
#[derive(Debug)]
pub struct MockResource {
    name: String,
    status: MockStatus,
    hits_to_complete: u64,
    hits: u64,
    after_sync_calls: usize,
    debug_message: Option<String>,
    shared_read: Option<(CacheKey, Arc<AtomicUsize>)>,
}

impl MockResource {
    pub fn new(name: impl Into<String>, status: MockStatus, hits_to_complete: u64) -> Self {
        Self {
            name: name.into(),
            status,
            hits_to_complete,
            hits: 0,
            after_sync_calls: 0,
            debug_message: None,
            shared_read: None,
        }
    }

    /// Read `key` through the sync cache on every sync, counting real fetches in `fetches`
    #[must_use]
    pub fn with_shared_read(mut self, key: CacheKey, fetches: Arc<AtomicUsize>) -> Self {
        self.shared_read = Some((key, fetches));
        self
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn after_sync_calls(&self) -> usize {
        self.after_sync_calls
    }

    fn hits_complete(&self) -> bool {
        self.hits >= self.hits_to_complete
    }
}

#[async_trait::async_trait]
impl Resource for MockResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "MockResource"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.hits_to_complete)
    }

    async fn sync(&mut self, cache: &mut SyncCache) {
        if let Some((key, fetches)) = &self.shared_read {
            let fetches = Arc::clone(fetches);
            let _: Result<Arc<()>, Infallible> = cache
                .get_or_try_fetch(key.clone(), || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
        }
        self.hits += 1;
    }

    async fn sync_debug_info(&mut self, _cache: &mut SyncCache) {
        self.debug_message = Some("Something went wrong".to_string());
    }

    fn after_sync(&mut self) {
        self.after_sync_calls += 1;
    }

    fn deploy_succeeded(&self) -> bool {
        self.status == MockStatus::Success && self.hits_complete()
    }

    fn deploy_failed(&self) -> bool {
        self.status == MockStatus::Failed && self.hits_complete()
    }

    fn deploy_timed_out(&self) -> bool {
        self.status == MockStatus::Timeout && self.hits_complete()
    }

    fn debug_message(&self) -> Option<String> {
        self.debug_message.clone()
    }

    fn pretty_status(&self) -> String {
        format!("{}  {} ({} hits)", self.name, self.status, self.hits)
    }
}

/// Severity of a captured narration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// [`ProgressSink`] that records every line and summary in memory.
#[derive(Debug, Default)]
pub struct CapturingProgress {
    lines: Mutex<Vec<(LogLevel, String)>>,
    summaries: Mutex<Vec<DeploySummary>>,
}

impl CapturingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured line with its level, in emission order
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Every captured message, in emission order
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, message)| message).collect()
    }

    pub fn summaries(&self) -> Vec<DeploySummary> {
        self.summaries.lock().unwrap().clone()
    }

    /// Number of captured messages containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|message| message.contains(needle)).count()
    }

    /// Whether, for each predicate in turn, a later message than the previous
    /// match satisfies it
    pub fn matches_in_order(&self, predicates: &[LinePredicate]) -> bool {
        let messages = self.messages();
        let mut remaining = messages.iter();
        predicates
            .iter()
            .all(|predicate| remaining.any(|message| predicate(message.as_str())))
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
        self.summaries.lock().unwrap().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl ProgressSink for CapturingProgress {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn record_summary(&self, summary: DeploySummary) {
        self.summaries.lock().unwrap().push(summary);
    }
}

/// Matcher over one narration line, see [`CapturingProgress::matches_in_order`].
pub type LinePredicate = Box<dyn Fn(&str) -> bool>;

/// Line equal to `expected`
pub fn exact(expected: &'static str) -> LinePredicate {
    Box::new(move |message: &str| message == expected)
}

/// Line of the form `<prefix><seconds>s<suffix>` with a non-negative elapsed figure
pub fn timed(prefix: &'static str, suffix: &'static str) -> LinePredicate {
    Box::new(move |message: &str| elapsed_seconds(message, prefix, suffix).is_some_and(|seconds| seconds >= 0.0))
}

/// The `X.Y` in `<prefix>X.Ys<suffix>`
pub fn elapsed_seconds(message: &str, prefix: &str, suffix: &str) -> Option<f64> {
    message
        .strip_prefix(prefix)?
        .strip_suffix(suffix)?
        .strip_suffix('s')?
        .parse()
        .ok()
}

/// [`MetricsSink`] that records every report in memory.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    reports: Mutex<Vec<(String, String, Duration)>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(kind, name, elapsed)` reports, in arrival order
    pub fn reports(&self) -> Vec<(String, String, Duration)> {
        self.reports.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record_watch_duration(&self, kind: &str, name: &str, elapsed: Duration) {
        self.reports
            .lock()
            .unwrap()
            .push((kind.to_string(), name.to_string(), elapsed));
    }
}
