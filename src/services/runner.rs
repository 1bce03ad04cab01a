//! Reconciles a whole set of desired quotas.
//!
//! The capability probe runs once up front and short-circuits the pass.
//! Each identity is then converged independently, up to
//! `max_concurrency` at a time.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DesiredQuota, QuotaIdentity};
use crate::services::controller::{Convergence, ConvergenceController};
use crate::services::probe::CapabilityProbe;

/// How one identity fared in a pass.
#[derive(Debug)]
pub struct ResourceResult {
    pub identity: QuotaIdentity,
    pub desired_value: f64,
    pub outcome: Result<Convergence, DomainError>,
}

impl ResourceResult {
    pub fn is_converged(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn is_pending(&self) -> bool {
        matches!(&self.outcome, Err(err) if err.is_pending())
    }

    pub fn is_failed(&self) -> bool {
        matches!(&self.outcome, Err(err) if !err.is_pending())
    }
}

/// Results of a pass, ordered by identity.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<ResourceResult>,
}

impl RunReport {
    pub fn converged(&self) -> usize {
        self.results.iter().filter(|r| r.is_converged()).count()
    }

    pub fn pending(&self) -> usize {
        self.results.iter().filter(|r| r.is_pending()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    /// No resource failed. Pending increases do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct ReconcileRunner {
    controller: Arc<ConvergenceController>,
    probe: CapabilityProbe,
    max_concurrency: usize,
}

impl ReconcileRunner {
    pub fn new(
        controller: Arc<ConvergenceController>,
        probe: CapabilityProbe,
        max_concurrency: usize,
    ) -> Self {
        Self {
            controller,
            probe,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Probe, then converge every desired quota.
    ///
    /// Only the probe can fail the pass as a whole; per-resource failures
    /// are collected in the report.
    #[instrument(skip_all, fields(resources = desired.len()))]
    pub async fn run(
        &self,
        desired: Vec<DesiredQuota>,
        cancel: &CancellationToken,
    ) -> DomainResult<RunReport> {
        self.probe.check().await?;

        let mut results: Vec<ResourceResult> = stream::iter(desired)
            .map(|quota| async move {
                let outcome = if cancel.is_cancelled() {
                    Err(DomainError::Cancelled {
                        identity: quota.identity.encode(),
                    })
                } else {
                    self.controller.apply(&quota, cancel).await
                };
                if let Err(err) = &outcome {
                    if err.is_pending() {
                        info!(identity = %quota.identity, error = %err, "increase still pending");
                    } else {
                        warn!(identity = %quota.identity, error = %err, "reconciliation failed");
                    }
                }
                ResourceResult {
                    identity: quota.identity,
                    desired_value: quota.value,
                    outcome,
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.sort_by(|a, b| a.identity.cmp(&b.identity));
        let report = RunReport { results };
        info!(
            converged = report.converged(),
            pending = report.pending(),
            failed = report.failed(),
            "reconciliation pass finished"
        );
        Ok(report)
    }
}
