//! Watcher errors

use std::time::Duration;
use thiserror::Error;

/// Errors that end a watch run.
///
/// Per-resource failures and per-resource timeouts are not errors: they are
/// recorded in the [`WatchOutcome`](crate::WatchOutcome) and the run goes on.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watcher was handed a collection or options it cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The global deadline passed while resources were still pending
    #[error(
        "Timed out after {:.1}s waiting for: {}",
        .timeout.as_secs_f64(),
        .pending.join(", ")
    )]
    DeploymentTimeout {
        /// The configured global timeout
        timeout: Duration,
        /// Ids of the resources that never reached a terminal state
        pending: Vec<String>,
    },

    /// Prometheus registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl WatchError {
    /// Whether this is the fatal global deadline outcome.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeploymentTimeout { .. })
    }
}
