//! Project initialization
//!
//! Creates the project-local `.quotakeeper/` directory, the default
//! configuration file, and the record database.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::sqlite::initialize_database;
use crate::domain::models::DatabaseConfig;
use crate::infrastructure::config::CONFIG_DIR;

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# quotakeeper configuration
# Override settings by editing this file, adding .quotakeeper/local.yaml,
# or setting environment variables with the QUOTAKEEPER_ prefix
#
# Example environment variables:
#   export QUOTAKEEPER_CLIENT__REGION=eu-west-1
#   export QUOTAKEEPER_POLLER__MAX_WAIT_SECS=600
#   export QUOTAKEEPER_RECONCILE__ALLOW_INCREASE_REQUESTS=true

client:
  # Region whose quotas are managed
  region: "us-east-1"

  # Endpoint override, e.g. a local signing proxy
  # endpoint: "http://127.0.0.1:8080"

  # Outbound requests per second
  requests_per_second: 5

  # Per-request timeout in seconds
  timeout_secs: 30

poller:
  # Seconds between increase-request status checks
  poll_interval_secs: 5

  # Wait budget per pass; unresolved requests are resumed on the next pass
  max_wait_secs: 60

reconcile:
  # Increase requests open real support cases and cannot be withdrawn
  allow_increase_requests: false

  # Quotas reconciled concurrently
  max_concurrency: 4

database:
  path: ".quotakeeper/records.db"
  max_connections: 5

logging:
  # trace, debug, info, warn, error
  level: "info"

  # json, pretty
  format: "pretty"

  # Rolling JSON log files; console only when unset
  # log_dir: ".quotakeeper/logs"
  rotation: "daily"
"#;

/// Paths managed by `init`
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl SetupPaths {
    /// Setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::at(current_dir))
    }

    /// Setup paths under `root`
    pub fn at(root: impl AsRef<Path>) -> Self {
        let config_dir = root.as_ref().join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("records.db"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")
}

/// Write the default configuration file. Returns whether it was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// Create the record database and apply migrations
pub async fn run_migrations(paths: &SetupPaths) -> Result<()> {
    let config = DatabaseConfig {
        path: paths.database_file.to_string_lossy().into_owned(),
        max_connections: 1,
    };
    let pool = initialize_database(&config)
        .await
        .context("Failed to initialize record database")?;
    pool.close().await;
    Ok(())
}
