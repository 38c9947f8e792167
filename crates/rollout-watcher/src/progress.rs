//! Progress narration sinks.

use crate::summary::DeploySummary;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

/// Receives narration lines while a run is in progress, and the summary at
/// the end of a completed run.
pub trait ProgressSink: Send + Sync {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Keep the end-of-run summary for later rendering
    fn record_summary(&self, summary: DeploySummary);
}

/// Narrates through `tracing` and holds on to the latest summary.
#[derive(Debug, Default)]
pub struct TracingProgress {
    summary: Mutex<Option<DeploySummary>>,
}

impl TracingProgress {
    /// The latest recorded summary, if any
    pub fn summary(&self) -> Option<DeploySummary> {
        self.summary.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Render the recorded summary, at info level on success and error level otherwise.
    ///
    /// Does nothing when no summary was recorded.
    pub fn print_summary(&self, success: bool) {
        let Some(summary) = self.summary() else {
            return;
        };

        for line in summary.render(success) {
            if success {
                info!("{}", line);
            } else {
                error!("{}", line);
            }
        }
    }
}

impl ProgressSink for TracingProgress {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn record_summary(&self, summary: DeploySummary) {
        *self.summary.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Operation;

    #[test]
    fn test_tracing_progress_keeps_latest_summary() {
        let progress = TracingProgress::default();
        assert!(progress.summary().is_none());
        progress.print_summary(true);

        let first = DeploySummary::new(&Operation::default(), vec!["a".to_string()], vec![], vec![], vec![]);
        let second = DeploySummary::new(&Operation::default(), vec![], vec!["b".to_string()], vec![], vec![]);
        progress.record_summary(first);
        progress.record_summary(second.clone());

        assert_eq!(progress.summary(), Some(second));
    }
}
