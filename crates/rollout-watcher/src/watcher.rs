//! The resource-watching loop.
//!
//! A [`ResourceWatcher`] borrows the caller's resources and polls them in
//! fixed-delay passes. Each pass:
//!
//! 1. checks the global deadline,
//! 2. syncs every pending resource through a fresh [`SyncCache`],
//! 3. moves resources that hit a terminal predicate into their bucket,
//! 4. narrates what finished and what is still outstanding,
//! 5. sleeps for the poll interval.
//!
//! The run ends when nothing is pending, or with
//! [`WatchError::DeploymentTimeout`] when the deadline passes first.

use crate::context::TaskContext;
use crate::error::WatchError;
use crate::resource::{Resource, TerminalState};
use crate::state::WatchState;
use crate::summary::DeploySummary;
use crate::sync_cache::SyncCache;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Default delay between two passes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default minimum delay between two "Still waiting for" reminders
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(30);

/// Per-run knobs for [`ResourceWatcher::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Constant delay between passes
    pub poll_interval: Duration,
    /// Minimum delay between reminders while nothing changes
    pub reminder_interval: Duration,
    /// Hand a [`DeploySummary`] to the progress sink when the run completes or
    /// hits the global timeout
    pub record_summary: bool,
}

impl RunOptions {
    /// Options polling every `poll_interval`, with the default reminder interval and summary recording on
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reminder_interval(mut self, reminder_interval: Duration) -> Self {
        self.reminder_interval = reminder_interval;
        self
    }

    #[must_use]
    pub fn record_summary(mut self, record_summary: bool) -> Self {
        self.record_summary = record_summary;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reminder_interval: DEFAULT_REMINDER_INTERVAL,
            record_summary: true,
        }
    }
}

/// Ids of the resources in each terminal bucket of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub timed_out: Vec<String>,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl WatchOutcome {
    /// True when nothing failed and nothing timed out
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }

    /// Number of resources that reached a terminal state
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.timed_out.len()
    }

    /// True when no resource reached a terminal state
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Polls a collection of resources until each reaches a terminal state.
pub struct ResourceWatcher<'a, R: Resource + ?Sized> {
    resources: Vec<&'a mut R>,
    context: TaskContext,
    timeout: Duration,
}

impl<'a, R: Resource + ?Sized> ResourceWatcher<'a, R> {
    /// Create a watcher over `resources`.
    ///
    /// Fails with [`WatchError::InvalidInput`] when two resources share an id,
    /// since narration and buckets are keyed by it.
    pub fn new<I>(resources: I, context: TaskContext, timeout: Duration) -> Result<Self, WatchError>
    where
        I: IntoIterator<Item = &'a mut R>,
    {
        let resources: Vec<&'a mut R> = resources.into_iter().collect();

        let mut seen = HashSet::with_capacity(resources.len());
        for resource in &resources {
            let id = resource.id();
            if !seen.insert(id.clone()) {
                return Err(WatchError::InvalidInput(format!(
                    "ResourceWatcher expects an enumerable collection of uniquely identified resources, got `{id}` more than once"
                )));
            }
        }

        Ok(Self {
            resources,
            context,
            timeout,
        })
    }

    /// Number of watched resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when the watcher has nothing to watch
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Global deadline for a whole run
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Namespace, operation and sinks the watcher narrates through
    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    /// Watch until every resource is terminal or the global timeout passes.
    pub async fn run(&mut self, options: RunOptions) -> Result<WatchOutcome, WatchError> {
        if options.poll_interval.is_zero() {
            return Err(WatchError::InvalidInput(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        let clock = self.context.clock().clone();
        let progress = self.context.progress().clone();
        let metrics = self.context.metrics().clone();
        let operation = self.context.operation().clone();

        let mut state = WatchState::new(self.resources.len(), clock.now());
        if !state.is_done() {
            progress.info(&format!("Continuing to wait for: {}", self.ids(state.pending())));
        }

        let mut pass = 0_u64;
        while !state.is_done() {
            let now = clock.now();
            if state.elapsed(now) >= self.timeout {
                let pending = state.pending().iter().map(|&index| self.resources[index].id()).collect();
                debug!("Global timeout of {:?} reached after {} passes", self.timeout, pass);
                // Pending resources are not in any bucket, so only finished ones are summarized
                if options.record_summary {
                    progress.record_summary(self.summarize(&state));
                }
                return Err(WatchError::DeploymentTimeout {
                    timeout: self.timeout,
                    pending,
                });
            }

            pass += 1;
            let mut cache = SyncCache::new();
            for &index in state.pending() {
                self.resources[index].sync(&mut cache).await;
            }

            let resources = &self.resources;
            let finished = state.reclassify(|index| TerminalState::of(&*resources[index]));

            let now = clock.now();
            let watch_time = state.elapsed(now);
            for &(index, terminal) in &finished {
                let elapsed = state.elapsed_for(index, now);
                let resource = &mut *self.resources[index];
                if terminal != TerminalState::Succeeded {
                    resource.sync_debug_info(&mut cache).await;
                }
                resource.after_sync();
                resource.report_watch_duration(elapsed, metrics.as_ref());
            }

            let stats = cache.stats();
            debug!(
                "Pass {} synced {} resources ({} cache hits, {} misses)",
                pass,
                state.pending().len() + finished.len(),
                stats.hits,
                stats.misses
            );
            drop(cache);

            let mut new_successes = Vec::new();
            for &(index, terminal) in &finished {
                let resource = &*self.resources[index];
                match terminal {
                    TerminalState::Succeeded => new_successes.push(index),
                    TerminalState::Failed => {
                        progress.error(&format!(
                            "{} failed to {} after {:.1}s",
                            resource.id(),
                            operation.name(),
                            watch_time.as_secs_f64()
                        ));
                        if let Some(message) = resource.debug_message() {
                            progress.warn(&message);
                        }
                    }
                    TerminalState::TimedOut => {
                        progress.error(&format!(
                            "{} rollout timed out after {:.1}s",
                            resource.id(),
                            watch_time.as_secs_f64()
                        ));
                        if let Some(message) = resource.debug_message() {
                            progress.warn(&message);
                        }
                    }
                }
            }
            if !new_successes.is_empty() {
                progress.info(&format!(
                    "Successfully {} in {:.1}s: {}",
                    operation.past_tense(),
                    watch_time.as_secs_f64(),
                    self.ids(&new_successes)
                ));
            }

            if !finished.is_empty() {
                if !state.is_done() {
                    progress.info(&format!("Continuing to wait for: {}", self.ids(state.pending())));
                }
                state.reset_reminder(now);
            } else if state.reminder_due(now, options.reminder_interval) {
                progress.info(&format!("Still waiting for: {}", self.ids(state.pending())));
                state.reset_reminder(now);
            }

            if !state.is_done() {
                clock.sleep(options.poll_interval).await;
            }
        }

        let elapsed = state.elapsed(clock.now());
        if options.record_summary {
            progress.record_summary(self.summarize(&state));
        }

        Ok(WatchOutcome {
            succeeded: self.bucket_ids(&state, TerminalState::Succeeded),
            failed: self.bucket_ids(&state, TerminalState::Failed),
            timed_out: self.bucket_ids(&state, TerminalState::TimedOut),
            elapsed,
        })
    }

    fn ids(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .map(|&index| self.resources[index].id())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn bucket_ids(&self, state: &WatchState, terminal: TerminalState) -> Vec<String> {
        state
            .bucket(terminal)
            .iter()
            .map(|&index| self.resources[index].id())
            .collect()
    }

    fn summarize(&self, state: &WatchState) -> DeploySummary {
        let statuses = |terminal| -> Vec<String> {
            state
                .bucket(terminal)
                .iter()
                .map(|&index| self.resources[index].pretty_status())
                .collect()
        };

        let debug_messages = state
            .bucket(TerminalState::Failed)
            .iter()
            .chain(state.bucket(TerminalState::TimedOut))
            .filter_map(|&index| self.resources[index].debug_message())
            .collect();

        DeploySummary::new(
            self.context.operation(),
            statuses(TerminalState::Succeeded),
            statuses(TerminalState::Failed),
            statuses(TerminalState::TimedOut),
            debug_messages,
        )
    }
}

impl<R: Resource + ?Sized> std::fmt::Debug for ResourceWatcher<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceWatcher")
            .field("resources", &self.resources.iter().map(|r| r.id()).collect::<Vec<_>>())
            .field("context", &self.context)
            .field("timeout", &self.timeout)
            .finish()
    }
}
