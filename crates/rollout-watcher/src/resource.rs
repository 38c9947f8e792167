//! Resource capability contract
//!
//! Anything that can be watched implements [`Resource`]. The watcher never
//! looks inside a resource: it asks it to refresh itself, then asks the three
//! terminal predicates in a fixed priority order.

use crate::metrics::MetricsSink;
use crate::sync_cache::SyncCache;
use std::fmt;
use std::time::Duration;

/// A unit of deployment under observation.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait Resource: Send {
    /// Object name, e.g. `web`
    fn name(&self) -> &str;

    /// Type label, e.g. `Deployment`
    fn kind(&self) -> &str;

    /// Identity shown in narration. Defaults to the name.
    fn id(&self) -> String {
        self.name().to_string()
    }

    /// The resource's own timeout, used by [`Resource::deploy_timed_out`].
    fn timeout(&self) -> Duration;

    /// Refresh internal status, reading through `cache` where possible.
    ///
    /// Transient API problems must be folded into the resource's own status,
    /// there is no error channel back to the watcher.
    async fn sync(&mut self, cache: &mut SyncCache);

    /// Gather extra diagnostics once the resource failed or timed out.
    async fn sync_debug_info(&mut self, _cache: &mut SyncCache) {}

    /// Called exactly once, after the terminal state has been recorded.
    fn after_sync(&mut self) {}

    fn deploy_succeeded(&self) -> bool;

    fn deploy_failed(&self) -> bool;

    fn deploy_timed_out(&self) -> bool;

    /// Diagnostic surfaced only for failed or timed-out resources.
    fn debug_message(&self) -> Option<String> {
        None
    }

    /// One line for the end-of-run summary.
    fn pretty_status(&self) -> String;

    /// Forward the time spent watching this resource to the metrics sink.
    fn report_watch_duration(&self, elapsed: Duration, metrics: &dyn MetricsSink) {
        metrics.record_watch_duration(self.kind(), self.name(), elapsed);
    }
}

#[async_trait::async_trait]
impl<R: Resource + ?Sized> Resource for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn id(&self) -> String {
        (**self).id()
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    async fn sync(&mut self, cache: &mut SyncCache) {
        (**self).sync(cache).await;
    }

    async fn sync_debug_info(&mut self, cache: &mut SyncCache) {
        (**self).sync_debug_info(cache).await;
    }

    fn after_sync(&mut self) {
        (**self).after_sync();
    }

    fn deploy_succeeded(&self) -> bool {
        (**self).deploy_succeeded()
    }

    fn deploy_failed(&self) -> bool {
        (**self).deploy_failed()
    }

    fn deploy_timed_out(&self) -> bool {
        (**self).deploy_timed_out()
    }

    fn debug_message(&self) -> Option<String> {
        (**self).debug_message()
    }

    fn pretty_status(&self) -> String {
        (**self).pretty_status()
    }

    fn report_watch_duration(&self, elapsed: Duration, metrics: &dyn MetricsSink) {
        (**self).report_watch_duration(elapsed, metrics);
    }
}

/// Terminal classification of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalState {
    Succeeded,
    Failed,
    TimedOut,
}

impl TerminalState {
    /// Classify a resource: succeeded wins over failed, failed over timed out.
    ///
    /// Returns `None` while the resource is still pending.
    pub fn of<R: Resource + ?Sized>(resource: &R) -> Option<Self> {
        if resource.deploy_succeeded() {
            Some(Self::Succeeded)
        } else if resource.deploy_failed() {
            Some(Self::Failed)
        } else if resource.deploy_timed_out() {
            Some(Self::TimedOut)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockResource, MockStatus};

    struct Flags {
        succeeded: bool,
        failed: bool,
        timed_out: bool,
    }

    #[async_trait::async_trait]
    impl Resource for Flags {
        fn name(&self) -> &str {
            "flags"
        }
        fn kind(&self) -> &str {
            "Flags"
        }
        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
        async fn sync(&mut self, _cache: &mut SyncCache) {}
        fn deploy_succeeded(&self) -> bool {
            self.succeeded
        }
        fn deploy_failed(&self) -> bool {
            self.failed
        }
        fn deploy_timed_out(&self) -> bool {
            self.timed_out
        }
        fn pretty_status(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_classification_priority() {
        let all = Flags { succeeded: true, failed: true, timed_out: true };
        assert_eq!(TerminalState::of(&all), Some(TerminalState::Succeeded));

        let failed_and_timed_out = Flags { succeeded: false, failed: true, timed_out: true };
        assert_eq!(TerminalState::of(&failed_and_timed_out), Some(TerminalState::Failed));

        let timed_out = Flags { succeeded: false, failed: false, timed_out: true };
        assert_eq!(TerminalState::of(&timed_out), Some(TerminalState::TimedOut));

        let pending = Flags { succeeded: false, failed: false, timed_out: false };
        assert_eq!(TerminalState::of(&pending), None);
    }

    #[tokio::test]
    async fn test_boxed_resource_forwards_to_inner() {
        let mut boxed: Box<dyn Resource> = Box::new(MockResource::new("web-pod", MockStatus::Success, 2));
        let mut cache = SyncCache::new();

        assert_eq!(boxed.id(), "web-pod");
        assert_eq!(boxed.kind(), "MockResource");
        boxed.sync(&mut cache).await;
        assert_eq!(TerminalState::of(&boxed), None);
        boxed.sync(&mut cache).await;
        assert_eq!(TerminalState::of(&boxed), Some(TerminalState::Succeeded));
        assert_eq!(boxed.pretty_status(), "web-pod  success (2 hits)");
    }
}
