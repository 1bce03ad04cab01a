//! Domain errors for quota reconciliation.
//!
//! Every failure a reconciliation pass can surface is a variant of
//! [`DomainError`]. Callers branch on [`DomainError::kind`] to decide what
//! the next pass should do; the message and the optional request id carry
//! the rest.

use thiserror::Error;

use super::models::RequestStatus;
use super::ports::errors::{ClientError, RepositoryError};

/// Coarse classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotManaged,
    MalformedIdentity,
    InvalidDesiredState,
    SubmitFailed,
    Rejected,
    TimedOut,
    FeatureUnavailable,
    IncreaseNotPermitted,
    Cancelled,
    Client,
    Repository,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotManaged => "not_managed",
            Self::MalformedIdentity => "malformed_identity",
            Self::InvalidDesiredState => "invalid_desired_state",
            Self::SubmitFailed => "submit_failed",
            Self::Rejected => "rejected",
            Self::TimedOut => "timed_out",
            Self::FeatureUnavailable => "feature_unavailable",
            Self::IncreaseNotPermitted => "increase_not_permitted",
            Self::Cancelled => "cancelled",
            Self::Client => "client",
            Self::Repository => "repository",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the convergence engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Quota not found: {0}")]
    NotFound(String),

    #[error("Quota {0} is not managed; create or import it first")]
    NotManaged(String),

    #[error("Malformed identity '{token}': {reason}")]
    MalformedIdentity { token: String, reason: String },

    #[error("Invalid desired state: {0}")]
    InvalidDesiredState(String),

    #[error("Increase request for {identity} was rejected: {source}")]
    SubmitFailed {
        identity: String,
        #[source]
        source: ClientError,
    },

    #[error("Increase request {request_id} for {identity} ended with status {status}")]
    Rejected {
        identity: String,
        request_id: String,
        status: RequestStatus,
    },

    #[error(
        "Increase request {request_id} for {identity} is still {last_status} after the wait budget; \
         the next pass resumes it"
    )]
    TimedOut {
        identity: String,
        request_id: String,
        last_status: RequestStatus,
    },

    #[error("Service quotas are unavailable for this account or region: {source}")]
    FeatureUnavailable {
        #[source]
        source: ClientError,
    },

    #[error(
        "Increase of {identity} to {value} requires reconcile.allow_increase_requests = true"
    )]
    IncreaseNotPermitted { identity: String, value: f64 },

    #[error("Reconciliation of {identity} was cancelled before submitting an increase")]
    Cancelled { identity: String },

    #[error("Remote service error: {0}")]
    Client(#[from] ClientError),

    #[error("Record store error: {0}")]
    Repository(#[from] RepositoryError),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotManaged(_) => ErrorKind::NotManaged,
            Self::MalformedIdentity { .. } => ErrorKind::MalformedIdentity,
            Self::InvalidDesiredState(_) => ErrorKind::InvalidDesiredState,
            Self::SubmitFailed { .. } => ErrorKind::SubmitFailed,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::FeatureUnavailable { .. } => ErrorKind::FeatureUnavailable,
            Self::IncreaseNotPermitted { .. } => ErrorKind::IncreaseNotPermitted,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Client(_) => ErrorKind::Client,
            Self::Repository(_) => ErrorKind::Repository,
        }
    }

    /// Remote increase request this error refers to, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Rejected { request_id, .. } | Self::TimedOut { request_id, .. } => {
                Some(request_id)
            }
            _ => None,
        }
    }

    /// A still-pending increase: not a failure, the next pass picks it up.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_is_pending_and_carries_request_id() {
        let err = DomainError::TimedOut {
            identity: "vpc/L-F678F1CE".to_string(),
            request_id: "req-1".to_string(),
            last_status: RequestStatus::CaseOpened,
        };
        assert!(err.is_pending());
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert_eq!(err.request_id(), Some("req-1"));
        assert!(err.to_string().contains("CASE_OPENED"));
    }

    #[test]
    fn test_rejected_is_not_pending() {
        let err = DomainError::Rejected {
            identity: "vpc/L-F678F1CE".to_string(),
            request_id: "req-2".to_string(),
            status: RequestStatus::Denied,
        };
        assert!(!err.is_pending());
        assert_eq!(err.request_id(), Some("req-2"));
        assert_eq!(err.kind().as_str(), "rejected");
    }

    #[test]
    fn test_cancelled_is_not_pending() {
        let err = DomainError::Cancelled {
            identity: "vpc/L-F678F1CE".to_string(),
        };
        assert!(!err.is_pending());
        assert_eq!(err.kind().as_str(), "cancelled");
        assert_eq!(err.request_id(), None);
    }

    #[test]
    fn test_client_error_converts() {
        let err: DomainError = ClientError::Throttled("slow down".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Client);
        assert_eq!(err.request_id(), None);
    }
}
