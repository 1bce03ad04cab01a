//! quotakeeper - declarative service quota reconciliation
//!
//! Converges declared quota values against a remote quota service. Values
//! that cannot be raised in place go through an increase request that is
//! polled for a bounded time and resumed on later passes instead of being
//! resubmitted.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors, and the port traits
//! - **Service Layer** (`services`): comparator, poller, controller, runner
//! - **Adapters** (`adapters`): HTTP and in-memory quota clients, SQLite and
//!   in-memory record stores
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use quotakeeper::infrastructure::{config::ConfigLoader, Engine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let engine = Engine::connect(&config).await?;
//!     let record = engine.controller().import("vpc/L-F678F1CE").await?;
//!     println!("{record:?}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, ErrorKind};
pub use domain::models::{
    Config, DesiredQuota, Manifest, ObservedQuota, QuotaChangeRequest, QuotaIdentity,
    RequestStatus, ResourceRecord,
};
pub use domain::ports::{ClientError, QuotaServiceClient, RecordRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConvergenceController, IncreasePoller, PollOutcome, ReconcileRunner};
