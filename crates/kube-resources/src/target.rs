//! `Kind/name` targets
//!
//! Parses user-supplied resource references and builds the matching
//! [`Resource`] implementation.

use crate::{Deployment, Pod, ResourceError};
use kube::Client;
use rollout_watcher::Resource;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Pod,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => crate::deployment::KIND,
            Self::Pod => crate::pod::KIND,
        }
    }

    pub fn default_timeout(self) -> Duration {
        match self {
            Self::Deployment => crate::deployment::DEFAULT_TIMEOUT,
            Self::Pod => crate::pod::DEFAULT_TIMEOUT,
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" | "deployments" | "deploy" => Ok(Self::Deployment),
            "pod" | "pods" | "po" => Ok(Self::Pod),
            _ => Err(ResourceError::UnsupportedKind(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource to watch, named as `Kind/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTarget {
    pub kind: ResourceKind,
    pub name: String,
    pub timeout: Option<Duration>,
}

impl ResourceTarget {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            timeout: None,
        }
    }

    /// Override the kind's default per-resource timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self, client: Client, namespace: &str) -> Box<dyn Resource> {
        let timeout = self.timeout.unwrap_or_else(|| self.kind.default_timeout());

        match self.kind {
            ResourceKind::Deployment => {
                Box::new(Deployment::new(client, namespace, &self.name).with_timeout(timeout))
            }
            ResourceKind::Pod => Box::new(Pod::new(client, namespace, &self.name).with_timeout(timeout)),
        }
    }
}

impl FromStr for ResourceTarget {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (kind, name) = trimmed
            .split_once('/')
            .ok_or_else(|| ResourceError::InvalidSpec(trimmed.to_string()))?;

        if name.is_empty() || name.contains('/') {
            return Err(ResourceError::InvalidSpec(trimmed.to_string()));
        }

        Ok(Self::new(kind.parse()?, name))
    }
}

/// Parse `Kind/name` and build the resource in `namespace`
pub fn resource_from_spec(spec: &str, client: Client, namespace: &str) -> Result<Box<dyn Resource>, ResourceError> {
    let target: ResourceTarget = spec.parse()?;
    Ok(target.build(client, namespace))
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}
