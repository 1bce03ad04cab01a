//! SQLite implementation of the RecordRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::models::{PendingRequest, QuotaIdentity, RequestStatus, ResourceRecord};
use crate::domain::ports::{RecordRepository, RepositoryError};

#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn get(&self, identity: &QuotaIdentity) -> Result<Option<ResourceRecord>, RepositoryError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"SELECT service_code, quota_code, last_applied_value, pending_request_id,
                      pending_requested_value, pending_status, updated_at
               FROM quota_records WHERE service_code = ? AND quota_code = ?"#,
        )
        .bind(identity.service_code())
        .bind(identity.quota_code())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResourceRecord::try_from).transpose()
    }

    async fn upsert(&self, record: &ResourceRecord) -> Result<(), RepositoryError> {
        let pending = record.pending.as_ref();

        sqlx::query(
            r#"INSERT INTO quota_records (service_code, quota_code, last_applied_value,
                   pending_request_id, pending_requested_value, pending_status, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (service_code, quota_code) DO UPDATE SET
                   last_applied_value = excluded.last_applied_value,
                   pending_request_id = excluded.pending_request_id,
                   pending_requested_value = excluded.pending_requested_value,
                   pending_status = excluded.pending_status,
                   updated_at = excluded.updated_at"#,
        )
        .bind(record.identity.service_code())
        .bind(record.identity.quota_code())
        .bind(record.last_applied_value)
        .bind(pending.map(|p| p.request_id.as_str()))
        .bind(pending.map(|p| p.requested_value))
        .bind(pending.map(|p| p.last_status.as_str()))
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, identity: &QuotaIdentity) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM quota_records WHERE service_code = ? AND quota_code = ?")
            .bind(identity.service_code())
            .bind(identity.quota_code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ResourceRecord>, RepositoryError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"SELECT service_code, quota_code, last_applied_value, pending_request_id,
                      pending_requested_value, pending_status, updated_at
               FROM quota_records ORDER BY service_code, quota_code"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResourceRecord::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    service_code: String,
    quota_code: String,
    last_applied_value: f64,
    pending_request_id: Option<String>,
    pending_requested_value: Option<f64>,
    pending_status: Option<String>,
    updated_at: String,
}

impl TryFrom<RecordRow> for ResourceRecord {
    type Error = RepositoryError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let identity = QuotaIdentity::new(row.service_code, row.quota_code)
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

        let updated_at = DateTime::parse_from_rfc3339(&row.updated_at)
            .map_err(|e| RepositoryError::Corrupt(format!("updated_at: {e}")))?
            .with_timezone(&Utc);

        let pending = match (row.pending_request_id, row.pending_requested_value, row.pending_status) {
            (Some(request_id), Some(requested_value), Some(status)) => {
                let last_status = RequestStatus::from_str(&status)
                    .ok_or_else(|| RepositoryError::Corrupt(format!("unknown request status '{status}'")))?;
                Some(PendingRequest {
                    request_id,
                    requested_value,
                    last_status,
                })
            }
            (None, None, None) => None,
            _ => {
                return Err(RepositoryError::Corrupt(format!(
                    "partial pending request for {identity}"
                )))
            }
        };

        Ok(ResourceRecord {
            identity,
            last_applied_value: row.last_applied_value,
            pending,
            updated_at,
        })
    }
}
