//! Kubernetes Resources
//!
//! [`Resource`](rollout_watcher::Resource) implementations for the workload
//! kinds the rollout watcher understands. Every kind lists its objects once per
//! namespace per pass through the [`SyncCache`](rollout_watcher::SyncCache), so
//! watching twenty Deployments costs one API call per pass, not twenty.
//!
//! # Example
//!
//! ```no_run
//! use kube_resources::ResourceTarget;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let target: ResourceTarget = "Deployment/web".parse()?;
//! let resource = target.build(client.clone(), "production");
//! assert_eq!(resource.id(), "Deployment/web");
//!
//! let pod = kube_resources::resource_from_spec("po/web-0", client, "production")?;
//! assert_eq!(pod.id(), "Pod/web-0");
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod deployment;
pub mod error;
pub mod pod;
pub mod target;

pub use deployment::Deployment;
pub use error::ResourceError;
pub use pod::Pod;
pub use target::{ResourceKind, ResourceTarget, resource_from_spec};
