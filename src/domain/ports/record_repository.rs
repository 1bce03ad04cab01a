use async_trait::async_trait;

use crate::domain::models::{QuotaIdentity, ResourceRecord};
use crate::domain::ports::errors::RepositoryError;

/// Repository port for managed quota records
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Get the record for an identity
    async fn get(&self, identity: &QuotaIdentity) -> Result<Option<ResourceRecord>, RepositoryError>;

    /// Insert or replace the record for its identity
    async fn upsert(&self, record: &ResourceRecord) -> Result<(), RepositoryError>;

    /// Remove a record. Returns whether one existed.
    async fn delete(&self, identity: &QuotaIdentity) -> Result<bool, RepositoryError>;

    /// All records, ordered by identity
    async fn list(&self) -> Result<Vec<ResourceRecord>, RepositoryError>;
}
