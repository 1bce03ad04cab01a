//! Persisted resource records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change_request::{QuotaChangeRequest, RequestStatus};
use super::identity::QuotaIdentity;

/// An increase request that was submitted (or adopted) but had not
/// reached a terminal status when the last pass ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request_id: String,
    pub requested_value: f64,
    pub last_status: RequestStatus,
}

impl PendingRequest {
    /// Rebuild the request object so polling can resume from it.
    pub fn to_request(&self, identity: &QuotaIdentity) -> QuotaChangeRequest {
        QuotaChangeRequest {
            id: self.request_id.clone(),
            identity: identity.clone(),
            desired_value: self.requested_value,
            status: self.last_status,
            case_id: None,
            created: None,
        }
    }
}

impl From<&QuotaChangeRequest> for PendingRequest {
    fn from(request: &QuotaChangeRequest) -> Self {
        Self {
            request_id: request.id.clone(),
            requested_value: request.desired_value,
            last_status: request.status,
        }
    }
}

/// Local record of a managed quota.
///
/// Created on successful create/import, updated on update, removed on
/// delete. Removing the record never touches the remote quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub identity: QuotaIdentity,
    pub last_applied_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingRequest>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(identity: QuotaIdentity, last_applied_value: f64) -> Self {
        Self {
            identity,
            last_applied_value,
            pending: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_pending(mut self, pending: PendingRequest) -> Self {
        self.pending = Some(pending);
        self
    }

    /// Record a new applied value and forget any pending request.
    pub fn applied(&mut self, value: f64) {
        self.last_applied_value = value;
        self.pending = None;
        self.updated_at = Utc::now();
    }

    pub fn track(&mut self, pending: PendingRequest) {
        self.pending = Some(pending);
        self.updated_at = Utc::now();
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
        self.updated_at = Utc::now();
    }

    pub fn pending_request_id(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.request_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc() -> QuotaIdentity {
        QuotaIdentity::new("vpc", "L-F678F1CE").unwrap()
    }

    #[test]
    fn test_applied_clears_pending() {
        let request = QuotaChangeRequest::new("req-1", vpc(), 75.0);
        let mut record = ResourceRecord::new(vpc(), 70.0).with_pending((&request).into());
        assert_eq!(record.pending_request_id(), Some("req-1"));

        record.applied(75.0);
        assert!(record.pending.is_none());
        assert!((record.last_applied_value - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pending_rebuilds_request() {
        let pending = PendingRequest {
            request_id: "req-9".to_string(),
            requested_value: 100.0,
            last_status: RequestStatus::CaseOpened,
        };
        let request = pending.to_request(&vpc());
        assert_eq!(request.id, "req-9");
        assert_eq!(request.status, RequestStatus::CaseOpened);
        assert!(request.is_open());
    }
}
