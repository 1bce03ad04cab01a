//! In-memory record repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{QuotaIdentity, ResourceRecord};
use crate::domain::ports::{RecordRepository, RepositoryError};

/// [`RecordRepository`] backed by an ordered map. Records do not outlive
/// the process.
#[derive(Default)]
pub struct InMemoryRecordRepository {
    records: Arc<RwLock<BTreeMap<QuotaIdentity, ResourceRecord>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn get(&self, identity: &QuotaIdentity) -> Result<Option<ResourceRecord>, RepositoryError> {
        Ok(self.records.read().await.get(identity).cloned())
    }

    async fn upsert(&self, record: &ResourceRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .insert(record.identity.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, identity: &QuotaIdentity) -> Result<bool, RepositoryError> {
        Ok(self.records.write().await.remove(identity).is_some())
    }

    async fn list(&self) -> Result<Vec<ResourceRecord>, RepositoryError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
