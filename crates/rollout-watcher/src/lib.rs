//! Rollout Watcher
//!
//! Observes applied Kubernetes resources until every one of them reaches a
//! terminal state (succeeded, failed or timed out) or a global deadline passes.
//!
//! # Example
//!
//! ```no_run
//! use rollout_watcher::{ResourceWatcher, RunOptions, TaskContext, TracingProgress, Resource};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(mut resources: Vec<Box<dyn Resource>>) -> Result<(), rollout_watcher::WatchError> {
//! let progress = Arc::new(TracingProgress::default());
//! let context = TaskContext::new("production", progress.clone());
//!
//! let mut watcher = ResourceWatcher::new(resources.iter_mut(), context, Duration::from_secs(300))?;
//! let outcome = watcher.run(RunOptions::new(Duration::from_secs(3))).await?;
//!
//! progress.print_summary(outcome.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! The resource collection only has to be iterable; anything else is rejected
//! before a single pass runs:
//!
//! ```compile_fail
//! use rollout_watcher::{ResourceWatcher, TaskContext, TracingProgress};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let context = TaskContext::new("test", Arc::new(TracingProgress::default()));
//! let watcher = ResourceWatcher::new(42_u32, context, Duration::from_secs(1));
//! ```
//!
//! # Features
//!
//! - **Resource trait**: one capability contract for every watched kind
//! - **Per-pass cache**: [`SyncCache`] deduplicates identical cluster reads within a pass
//! - **Narration**: batched success lines, per-resource failures, periodic reminders
//! - **Summary**: end-of-run [`DeploySummary`] handed to the [`ProgressSink`]
//! - **Deadline**: a global timeout returned as [`WatchError::DeploymentTimeout`]

pub mod clock;
pub mod context;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod resource;
mod state;
pub mod summary;
pub mod sync_cache;
pub mod watcher;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;


pub use clock::{Clock, TokioClock};
pub use context::{Operation, TaskContext};
pub use error::WatchError;
pub use metrics::{MetricsSink, NoopMetrics, PrometheusMetrics};
pub use progress::{ProgressSink, TracingProgress};
pub use resource::{Resource, TerminalState};
pub use summary::DeploySummary;
pub use sync_cache::{CacheKey, CacheStats, SyncCache};
pub use watcher::{ResourceWatcher, RunOptions, WatchOutcome};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{CapturingProgress, LinePredicate, LogLevel, MockResource, MockStatus, RecordingMetrics};
