use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project configuration and the record database
pub const CONFIG_DIR: &str = ".quotakeeper";

/// Prefix of environment overrides, e.g. `QUOTAKEEPER_POLLER__MAX_WAIT_SECS`
pub const ENV_PREFIX: &str = "QUOTAKEEPER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Region cannot be empty")]
    EmptyRegion,

    #[error("Invalid endpoint: {0}. Must start with http:// or https://")]
    InvalidEndpoint(String),

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(u32),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid poll_interval_secs: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Invalid max_concurrency: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrency(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .quotakeeper/config.yaml (project config, created by init)
    /// 3. .quotakeeper/local.yaml (project local overrides, optional)
    /// 4. Environment variables (QUOTAKEEPER_* prefix, `__` between sections)
    pub fn load() -> Result<Config> {
        let dir = Path::new(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let client = &config.client;
        if client.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if let Some(endpoint) = &client.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
            }
        }
        if client.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(client.requests_per_second));
        }
        if client.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(client.timeout_secs));
        }

        if config.poller.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(config.poller.poll_interval_secs));
        }

        let concurrency = config.reconcile.max_concurrency;
        if concurrency == 0 || concurrency > 64 {
            return Err(ConfigError::InvalidMaxConcurrency(concurrency));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
