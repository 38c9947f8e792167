//! Task context handed to a watcher.
//!
//! Carries the collaborators a run reports to (progress, metrics, clock) and
//! the descriptive bits of the task (namespace, kube context, operation).

use crate::clock::{Clock, TokioClock};
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::progress::ProgressSink;
use std::fmt;
use std::sync::Arc;

/// The verb a run narrates with, e.g. `deploy` or `restart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation(String);

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// `deploy` -> `deployed`, `run` -> `ran`
    #[must_use]
    pub fn past_tense(&self) -> String {
        match self.0.as_str() {
            "run" => "ran".to_string(),
            name if name.ends_with('e') => format!("{name}d"),
            name => format!("{name}ed"),
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::new("deploy")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a watcher needs besides its resources and timeout.
#[derive(Clone)]
pub struct TaskContext {
    namespace: String,
    kube_context: Option<String>,
    operation: Operation,
    progress: Arc<dyn ProgressSink>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl TaskContext {
    /// Context with no-op metrics, the Tokio clock and the `deploy` operation
    pub fn new(namespace: impl Into<String>, progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            namespace: namespace.into(),
            kube_context: None,
            operation: Operation::default(),
            progress,
            metrics: Arc::new(NoopMetrics),
            clock: Arc::new(TokioClock),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    #[must_use]
    pub fn with_kube_context(mut self, kube_context: Option<String>) -> Self {
        self.kube_context = kube_context;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kube_context(&self) -> Option<&str> {
        self.kube_context.as_deref()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn progress(&self) -> &Arc<dyn ProgressSink> {
        &self.progress
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("namespace", &self.namespace)
            .field("kube_context", &self.kube_context)
            .field("operation", &self.operation)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_past_tense() {
        assert_eq!(Operation::default().past_tense(), "deployed");
        assert_eq!(Operation::new("restart").past_tense(), "restarted");
        assert_eq!(Operation::new("run").past_tense(), "ran");
        assert_eq!(Operation::new("delete").past_tense(), "deleted");
    }
}
