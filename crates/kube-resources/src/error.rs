//! Resource construction errors

use thiserror::Error;

/// Errors that can occur while turning user input into watchable resources
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The kind is not one this crate can watch
    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    /// The target is not of the form `Kind/name`
    #[error("Invalid resource `{0}`: expected Kind/name")]
    InvalidSpec(String),
}
