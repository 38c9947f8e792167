//! Watch-duration metrics.

use crate::error::WatchError;
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use std::time::Duration;

/// Receives `(kind, name, elapsed)` for every resource that reaches a
/// terminal state. Fire-and-forget: implementations swallow their own errors.
pub trait MetricsSink: Send + Sync {
    fn record_watch_duration(&self, kind: &str, name: &str, elapsed: Duration);
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_watch_duration(&self, _kind: &str, _name: &str, _elapsed: Duration) {}
}

/// Prometheus histogram of watch durations, labelled by kind and name.
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    watch_duration: HistogramVec,
}

impl PrometheusMetrics {
    /// Create the histogram and register it in `registry`
    pub fn register(registry: &Registry) -> Result<Self, WatchError> {
        let watch_duration = HistogramVec::new(
            HistogramOpts::new(
                "rollout_watch_duration_seconds",
                "Time spent watching a resource until it reached a terminal state",
            )
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
            &["kind", "name"],
        )?;
        registry.register(Box::new(watch_duration.clone()))?;

        Ok(Self { watch_duration })
    }

    /// Number of observations recorded for one resource
    pub fn sample_count(&self, kind: &str, name: &str) -> u64 {
        self.watch_duration.with_label_values(&[kind, name]).get_sample_count()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_watch_duration(&self, kind: &str, name: &str, elapsed: Duration) {
        self.watch_duration
            .with_label_values(&[kind, name])
            .observe(elapsed.as_secs_f64());
    }
}

/// Render everything in `registry` in the Prometheus text format
pub fn gather_text(registry: &Registry) -> Result<String, WatchError> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_metrics_records_durations() {
        let registry = Registry::new();
        let metrics = PrometheusMetrics::register(&registry).unwrap();

        metrics.record_watch_duration("Deployment", "web", Duration::from_millis(1500));
        metrics.record_watch_duration("Deployment", "web", Duration::from_secs(3));

        assert_eq!(metrics.sample_count("Deployment", "web"), 2);
        assert_eq!(metrics.sample_count("Pod", "web"), 0);

        let text = gather_text(&registry).unwrap();
        assert!(text.contains("rollout_watch_duration_seconds_count{kind=\"Deployment\",name=\"web\"} 2"));
    }

    #[test]
    fn test_double_registration_is_an_error() {
        let registry = Registry::new();
        PrometheusMetrics::register(&registry).unwrap();

        assert!(matches!(PrometheusMetrics::register(&registry), Err(WatchError::Metrics(_))));
    }
}
