//! CLI command implementations.

pub mod apply;
pub mod forget;
pub mod import;
pub mod init;
pub mod list;
pub mod probe;
pub mod show;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::output::format_value;
use crate::domain::models::{RequestStatus, ResourceRecord};

/// A managed record as printed by several commands.
#[derive(Debug, Serialize)]
pub struct RecordOutput {
    pub identity: String,
    pub service_code: String,
    pub quota_code: String,
    pub value: f64,
    pub pending_request_id: Option<String>,
    pub pending_status: Option<RequestStatus>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ResourceRecord> for RecordOutput {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            identity: record.identity.encode(),
            service_code: record.identity.service_code().to_string(),
            quota_code: record.identity.quota_code().to_string(),
            value: record.last_applied_value,
            pending_request_id: record.pending.as_ref().map(|p| p.request_id.clone()),
            pending_status: record.pending.as_ref().map(|p| p.last_status),
            updated_at: record.updated_at,
        }
    }
}

impl RecordOutput {
    fn pending_summary(&self) -> Option<String> {
        match (&self.pending_request_id, self.pending_status) {
            (Some(id), Some(status)) => Some(format!("{id} ({status})")),
            _ => None,
        }
    }

    fn value_text(&self) -> String {
        format_value(self.value)
    }
}
