//! Environment configuration

use crate::error::ConfigError;
use kube_resources::ResourceTarget;
use rollout_watcher::watcher::{DEFAULT_POLL_INTERVAL, DEFAULT_REMINDER_INTERVAL};
use std::env;
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_OPERATION: &str = "deploy";

/// How the end-of-run summary is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// Log lines through `tracing`
    #[default]
    Text,
    /// A JSON document on stdout
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub namespace: String,
    pub resources: Vec<ResourceTarget>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub reminder_interval: Duration,
    pub record_summary: bool,
    pub operation: String,
    pub kube_context: Option<String>,
    pub summary_format: SummaryFormat,
}

impl WatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let resources = var("WATCH_RESOURCES")
            .ok_or(ConfigError::Missing("WATCH_RESOURCES"))?
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse::<ResourceTarget>)
            .collect::<Result<Vec<ResourceTarget>, _>>()?;

        if resources.is_empty() {
            return Err(ConfigError::Missing("WATCH_RESOURCES"));
        }

        let poll_interval = seconds("POLL_INTERVAL_SECS", var("POLL_INTERVAL_SECS"), DEFAULT_POLL_INTERVAL)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            namespace: var("WATCH_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            resources,
            timeout: seconds("ROLLOUT_TIMEOUT_SECS", var("ROLLOUT_TIMEOUT_SECS"), DEFAULT_TIMEOUT)?,
            poll_interval,
            reminder_interval: seconds(
                "REMINDER_INTERVAL_SECS",
                var("REMINDER_INTERVAL_SECS"),
                DEFAULT_REMINDER_INTERVAL,
            )?,
            record_summary: flag("RECORD_SUMMARY", var("RECORD_SUMMARY"), true)?,
            operation: var("OPERATION_NAME").unwrap_or_else(|| DEFAULT_OPERATION.to_string()),
            kube_context: var("KUBE_CONTEXT"),
            summary_format: summary_format(var("SUMMARY_FORMAT"))?,
        })
    }
}

fn seconds(key: &'static str, value: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        })
}

fn flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn summary_format(value: Option<String>) -> Result<SummaryFormat, ConfigError> {
    let Some(value) = value else {
        return Ok(SummaryFormat::default());
    };

    match value.to_ascii_lowercase().as_str() {
        "text" => Ok(SummaryFormat::Text),
        "json" => Ok(SummaryFormat::Json),
        _ => Err(ConfigError::Invalid {
            key: "SUMMARY_FORMAT",
            value,
            reason: "expected text or json".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube_resources::{ResourceError, ResourceKind};
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<WatchConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WatchConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("WATCH_RESOURCES", "Deployment/web, Pod/migrate-1")]).unwrap();

        assert_eq!(config.namespace, "default");
        assert_eq!(
            config.resources,
            vec![
                ResourceTarget::new(ResourceKind::Deployment, "web"),
                ResourceTarget::new(ResourceKind::Pod, "migrate-1"),
            ]
        );
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.reminder_interval, Duration::from_secs(30));
        assert!(config.record_summary);
        assert_eq!(config.operation, "deploy");
        assert_eq!(config.kube_context, None);
        assert_eq!(config.summary_format, SummaryFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WATCH_RESOURCES", "deploy/api"),
            ("WATCH_NAMESPACE", "production"),
            ("ROLLOUT_TIMEOUT_SECS", "600"),
            ("POLL_INTERVAL_SECS", "5"),
            ("REMINDER_INTERVAL_SECS", "60"),
            ("RECORD_SUMMARY", "off"),
            ("OPERATION_NAME", "restart"),
            ("KUBE_CONTEXT", "staging"),
            ("SUMMARY_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.namespace, "production");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.reminder_interval, Duration::from_secs(60));
        assert!(!config.record_summary);
        assert_eq!(config.operation, "restart");
        assert_eq!(config.kube_context.as_deref(), Some("staging"));
        assert_eq!(config.summary_format, SummaryFormat::Json);
    }

    #[test]
    fn test_resources_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("WATCH_RESOURCES"))));
        assert!(matches!(
            load(&[("WATCH_RESOURCES", " , ")]),
            Err(ConfigError::Missing("WATCH_RESOURCES"))
        ));
    }

    #[test]
    fn test_bad_resource_entry() {
        let err = load(&[("WATCH_RESOURCES", "Deployment/web,CronJob/nightly")]).unwrap_err();
        assert!(matches!(err, ConfigError::Resource(ResourceError::UnsupportedKind(_))));
    }

    #[test]
    fn test_bad_numbers() {
        let err = load(&[("WATCH_RESOURCES", "Pod/a"), ("ROLLOUT_TIMEOUT_SECS", "ten")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ROLLOUT_TIMEOUT_SECS", .. }));

        let err = load(&[("WATCH_RESOURCES", "Pod/a"), ("POLL_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "POLL_INTERVAL_SECS", .. }));
    }

    #[test]
    fn test_bad_flag_and_format() {
        let err = load(&[("WATCH_RESOURCES", "Pod/a"), ("RECORD_SUMMARY", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RECORD_SUMMARY", .. }));

        let err = load(&[("WATCH_RESOURCES", "Pod/a"), ("SUMMARY_FORMAT", "yaml")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for SUMMARY_FORMAT: `yaml` (expected text or json)"
        );
    }
}
