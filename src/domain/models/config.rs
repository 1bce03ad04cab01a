use serde::{Deserialize, Serialize};

/// Main configuration structure for quotakeeper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Remote quota service client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Increase-request polling configuration
    #[serde(default)]
    pub poller: PollerConfig,

    /// Reconciliation policy
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote quota service client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Region whose quotas are managed
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override; derived from the region when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Outbound requests per second, shared by all concurrent reconciliations
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

const fn default_requests_per_second() -> u32 {
    5
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Endpoint to call: the override if set, else the regional default.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://servicequotas.{}.amazonaws.com", self.region))
    }
}

/// Increase-request polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollerConfig {
    /// Seconds between status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wait budget per reconciliation pass, in seconds
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_max_wait_secs() -> u64 {
    60
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// Reconciliation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconcileConfig {
    /// Submitting an increase request has real-world effects and cannot be
    /// rolled back, so it is off unless enabled here
    #[serde(default)]
    pub allow_increase_requests: bool,

    /// Quotas reconciled concurrently in one pass
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

const fn default_max_concurrency() -> usize {
    4
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            allow_increase_requests: false,
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".quotakeeper/records.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
