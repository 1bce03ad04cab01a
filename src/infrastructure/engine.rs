//! Wires ports to adapters from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::http::HttpQuotaClient;
use crate::adapters::sqlite::{initialize_database, SqliteRecordRepository};
use crate::domain::models::Config;
use crate::domain::ports::{QuotaServiceClient, RecordRepository};
use crate::services::{
    CapabilityProbe, ConvergenceController, IncreasePoller, PollPolicy, ReconcileRunner,
};

/// The reconciliation services sharing one client and one record store.
pub struct Engine {
    client: Arc<dyn QuotaServiceClient>,
    controller: Arc<ConvergenceController>,
    max_concurrency: usize,
}

impl Engine {
    pub fn new(
        client: Arc<dyn QuotaServiceClient>,
        records: Arc<dyn RecordRepository>,
        config: &Config,
    ) -> Self {
        let poller = IncreasePoller::new(client.clone(), PollPolicy::from(&config.poller));
        let controller = ConvergenceController::new(client.clone(), records, poller)
            .allow_increase_requests(config.reconcile.allow_increase_requests);

        Self {
            client,
            controller: Arc::new(controller),
            max_concurrency: config.reconcile.max_concurrency,
        }
    }

    /// HTTP client against the configured endpoint, SQLite record store.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = HttpQuotaClient::new(&config.client)
            .context("Failed to build quota service client")?;
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("Failed to open record database {}", config.database.path))?;

        tracing::debug!(endpoint = client.endpoint(), database = %config.database.path, "engine connected");
        Ok(Self::new(
            Arc::new(client),
            Arc::new(SqliteRecordRepository::new(pool)),
            config,
        ))
    }

    pub fn controller(&self) -> &ConvergenceController {
        &self.controller
    }

    pub fn probe(&self) -> CapabilityProbe {
        CapabilityProbe::new(self.client.clone())
    }

    pub fn runner(&self) -> ReconcileRunner {
        ReconcileRunner::new(self.controller.clone(), self.probe(), self.max_concurrency)
    }
}
