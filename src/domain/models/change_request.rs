//! Quota increase requests.
//!
//! An increase request is owned by the remote system. This process creates
//! it and afterwards only observes it; the status moves through
//! `PENDING -> CASE_OPENED -> {APPROVED | DENIED | NOT_APPROVED | CASE_CLOSED}`
//! on the remote side over wall-clock time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::QuotaIdentity;

/// Status of a quota increase request as reported by the remote system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Submitted, not yet picked up
    Pending,
    /// A support case has been opened for the request
    CaseOpened,
    /// Granted; the new value is (or will shortly be) in effect
    Approved,
    /// Refused
    Denied,
    /// Closed without approval
    NotApproved,
    /// Support case closed before a decision
    CaseClosed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::CaseOpened => "CASE_OPENED",
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::NotApproved => "NOT_APPROVED",
            Self::CaseClosed => "CASE_CLOSED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "CASE_OPENED" => Some(Self::CaseOpened),
            "APPROVED" => Some(Self::Approved),
            "DENIED" => Some(Self::Denied),
            "NOT_APPROVED" => Some(Self::NotApproved),
            "CASE_CLOSED" => Some(Self::CaseClosed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::CaseOpened)
    }

    /// Only an approved request counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Terminal and not approved.
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && !self.is_success()
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<RequestStatus> {
        match self {
            Self::Pending => vec![
                Self::CaseOpened,
                Self::Approved,
                Self::Denied,
                Self::NotApproved,
                Self::CaseClosed,
            ],
            Self::CaseOpened => vec![
                Self::Approved,
                Self::Denied,
                Self::NotApproved,
                Self::CaseClosed,
            ],
            Self::Approved | Self::Denied | Self::NotApproved | Self::CaseClosed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote quota increase request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaChangeRequest {
    pub id: String,
    pub identity: QuotaIdentity,
    pub desired_value: f64,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl QuotaChangeRequest {
    pub fn new(id: impl Into<String>, identity: QuotaIdentity, desired_value: f64) -> Self {
        Self {
            id: id.into(),
            identity,
            desired_value,
            status: RequestStatus::Pending,
            case_id: None,
            created: Some(Utc::now()),
        }
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }

    /// Still open on the remote side.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}
