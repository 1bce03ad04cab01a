//! Shared fixtures for integration tests
//!
//! Builds controllers and runners over the in-memory adapters so scenarios
//! can script the remote service and inspect the record store.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use quotakeeper::adapters::memory::{InMemoryQuotaClient, InMemoryRecordRepository};
use quotakeeper::domain::models::{DesiredQuota, QuotaIdentity};
use quotakeeper::services::{
    CapabilityProbe, ConvergenceController, IncreasePoller, PollPolicy, ReconcileRunner,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_WAIT: Duration = Duration::from_secs(60);

pub fn vpc() -> QuotaIdentity {
    QuotaIdentity::new("vpc", "L-F678F1CE").expect("valid identity")
}

pub fn ec2() -> QuotaIdentity {
    QuotaIdentity::new("ec2", "L-1216C47A").expect("valid identity")
}

pub fn desired(identity: QuotaIdentity, value: f64) -> DesiredQuota {
    DesiredQuota::new(identity, value).expect("valid desired quota")
}

/// In-memory remote service and record store shared by a scenario.
pub struct Harness {
    pub client: Arc<InMemoryQuotaClient>,
    pub records: Arc<InMemoryRecordRepository>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            client: Arc::new(InMemoryQuotaClient::new()),
            records: Arc::new(InMemoryRecordRepository::new()),
        }
    }

    pub fn poller(&self) -> IncreasePoller {
        IncreasePoller::new(
            self.client.clone(),
            PollPolicy {
                poll_interval: POLL_INTERVAL,
                max_wait: MAX_WAIT,
            },
        )
    }

    /// Controller permitted to submit increase requests.
    pub fn controller(&self) -> ConvergenceController {
        ConvergenceController::new(self.client.clone(), self.records.clone(), self.poller())
            .allow_increase_requests(true)
    }

    /// Controller with the default opt-in (no new submissions).
    pub fn read_only_controller(&self) -> ConvergenceController {
        ConvergenceController::new(self.client.clone(), self.records.clone(), self.poller())
    }

    pub fn runner(&self, max_concurrency: usize) -> ReconcileRunner {
        ReconcileRunner::new(
            Arc::new(self.controller()),
            CapabilityProbe::new(self.client.clone()),
            max_concurrency,
        )
    }
}

/// Initializes a tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
