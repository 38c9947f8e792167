//! Rollout Watch
//!
//! Waits for the Deployments and Pods named in `WATCH_RESOURCES` to finish
//! rolling out, narrating progress as it goes. Exits non-zero when any of them
//! fails, times out, or the whole rollout exceeds `ROLLOUT_TIMEOUT_SECS`.

mod config;
mod error;

use anyhow::{Context, Result, bail};
use config::{SummaryFormat, WatchConfig};
use kube::Client;
use kube::config::KubeConfigOptions;
use prometheus::Registry;
use rollout_watcher::metrics::gather_text;
use rollout_watcher::{
    Operation, PrometheusMetrics, Resource, ResourceWatcher, RunOptions, TaskContext, TracingProgress,
};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // kube's rustls stack needs a process-wide crypto provider
    let provider_installed = rustls::crypto::ring::default_provider().install_default().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if !provider_installed {
        debug!("rustls crypto provider was already installed, keeping it");
    }

    info!("Starting Rollout Watch");

    let config = WatchConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace);
    info!("  Kube context: {}", config.kube_context.as_deref().unwrap_or("inferred"));
    info!("  Timeout: {}s", config.timeout.as_secs());
    info!("  Poll interval: {}s", config.poll_interval.as_secs());

    let client = kube_client(config.kube_context.as_deref()).await?;

    let mut resources: Vec<Box<dyn Resource>> = config
        .resources
        .iter()
        .map(|target| target.build(client.clone(), &config.namespace))
        .collect();

    let registry = Registry::new();
    let metrics = PrometheusMetrics::register(&registry)?;
    let progress = Arc::new(TracingProgress::default());

    let context = TaskContext::new(config.namespace.clone(), progress.clone())
        .with_metrics(Arc::new(metrics))
        .with_operation(Operation::new(config.operation.clone()))
        .with_kube_context(config.kube_context.clone());

    let options = RunOptions::new(config.poll_interval)
        .reminder_interval(config.reminder_interval)
        .record_summary(config.record_summary);

    let mut watcher = ResourceWatcher::new(resources.iter_mut(), context, config.timeout)?;
    let result = watcher.run(options).await;

    let success = result.as_ref().is_ok_and(|outcome| outcome.is_success());
    match config.summary_format {
        SummaryFormat::Text => progress.print_summary(success),
        SummaryFormat::Json => {
            if let Some(summary) = progress.summary() {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
    }

    debug!("Watch metrics:\n{}", gather_text(&registry)?);

    let outcome = result?;
    if !outcome.is_success() {
        bail!(
            "Rollout failed: {} failed, {} timed out",
            outcome.failed.len(),
            outcome.timed_out.len()
        );
    }

    info!(
        "Rollout complete: {} resource(s) in {:.1}s",
        outcome.succeeded.len(),
        outcome.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Client for the named kubeconfig context, or the inferred in-cluster/local config
async fn kube_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            kube::Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("Failed to load kubeconfig context {context}"))?
        }
        None => kube::Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    Client::try_from(config).context("Failed to create Kubernetes client")
}
