//! Implementation of the `quotakeeper apply` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::cli::display::{colorize_outcome, list_table, render_list};
use crate::cli::output::{format_value, output, CommandOutput};
use crate::domain::models::{Config, Manifest};
use crate::infrastructure::Engine;
use crate::services::{ConvergeAction, ResourceResult, RunReport};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// YAML manifest declaring the desired quotas
    pub manifest: PathBuf,

    /// Override poller.max_wait_secs for this run
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Override poller.poll_interval_secs for this run
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct ResourceOutput {
    pub identity: String,
    pub desired_value: f64,
    /// converged, pending, or failed
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ResourceResult> for ResourceOutput {
    fn from(result: &ResourceResult) -> Self {
        let identity = result.identity.encode();
        match &result.outcome {
            Ok(convergence) => Self {
                identity,
                desired_value: result.desired_value,
                outcome: "converged",
                value: Some(convergence.record.last_applied_value),
                request_id: match &convergence.action {
                    ConvergeAction::Increased { request_id } => Some(request_id.clone()),
                    ConvergeAction::Unchanged => None,
                },
                error_kind: None,
                message: None,
            },
            Err(err) => Self {
                identity,
                desired_value: result.desired_value,
                outcome: if err.is_pending() { "pending" } else { "failed" },
                value: None,
                request_id: err.request_id().map(str::to_string),
                error_kind: Some(err.kind().to_string()),
                message: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ApplyOutput {
    pub resources: Vec<ResourceOutput>,
    pub converged: usize,
    pub pending: usize,
    pub failed: usize,
}

impl From<&RunReport> for ApplyOutput {
    fn from(report: &RunReport) -> Self {
        Self {
            resources: report.results.iter().map(ResourceOutput::from).collect(),
            converged: report.converged(),
            pending: report.pending(),
            failed: report.failed(),
        }
    }
}

impl CommandOutput for ApplyOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["identity", "desired", "outcome", "value", "detail"]);
        for resource in &self.resources {
            table.add_row(vec![
                resource.identity.clone(),
                format_value(resource.desired_value),
                colorize_outcome(resource.outcome).to_string(),
                resource.value.map(format_value).unwrap_or_else(|| "-".to_string()),
                resource
                    .message
                    .clone()
                    .or_else(|| resource.request_id.as_ref().map(|id| format!("approved request {id}")))
                    .unwrap_or_default(),
            ]);
        }

        format!(
            "{}\n\n{} converged, {} pending, {} failed",
            render_list("quota", table, self.resources.len()),
            self.converged,
            self.pending,
            self.failed
        )
    }
}

pub async fn execute(args: ApplyArgs, config: &Config, json_mode: bool) -> Result<()> {
    let source = tokio::fs::read_to_string(&args.manifest)
        .await
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let desired = Manifest::from_yaml(&source)?.desired()?;

    let mut config = config.clone();
    if let Some(max_wait) = args.max_wait_secs {
        config.poller.max_wait_secs = max_wait;
    }
    if let Some(interval) = args.poll_interval_secs {
        anyhow::ensure!(interval > 0, "--poll-interval-secs must be at least 1");
        config.poller.poll_interval_secs = interval;
    }

    let engine = Engine::connect(&config).await?;

    // Ctrl-C stops waiting; unresolved requests are remembered for the next run.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, recording pending increase requests");
            interrupt.cancel();
        }
    });

    let report = engine.runner().run(desired, &cancel).await?;
    let summary = ApplyOutput::from(&report);
    output(&summary, json_mode);

    if !report.is_success() {
        anyhow::bail!("{} of {} quota(s) failed to converge", summary.failed, summary.resources.len());
    }
    Ok(())
}
