//! Port trait definitions (Hexagonal Architecture)
//!
//! - QuotaServiceClient: the remote quota service
//! - RecordRepository: persistence of managed quota records
//!
//! The services depend only on these traits, so reconciliation logic can be
//! exercised against in-memory fakes.

pub mod errors;
pub mod quota_client;
pub mod record_repository;

pub use errors::{ClientError, RepositoryError};
pub use quota_client::QuotaServiceClient;
pub use record_repository::RecordRepository;
