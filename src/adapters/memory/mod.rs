//! In-memory adapters for tests.

pub mod quota_client;
pub mod record_repository;

pub use quota_client::InMemoryQuotaClient;
pub use record_repository::InMemoryRecordRepository;
