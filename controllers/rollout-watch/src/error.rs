//! Controller-specific error types.

use kube_resources::ResourceError;
use thiserror::Error;

/// Errors reading the watch configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("Invalid value for {key}: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// An entry of WATCH_RESOURCES is not a watchable `Kind/name`
    #[error("Invalid entry in WATCH_RESOURCES: {0}")]
    Resource(#[from] ResourceError),
}
