use thiserror::Error;

/// Failures reported by a [`QuotaServiceClient`](super::QuotaServiceClient).
///
/// Messages are kept as strings so fakes can script the same error more
/// than once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The addressed quota, service, or request does not exist (HTTP 404,
    /// `NoSuchResourceException`)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Caller lacks permission (HTTP 403, `AccessDeniedException`)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The feature is not offered in the configured region
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    /// The remote rejected the request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded (HTTP 429, `TooManyRequestsException`)
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Server-side failure (HTTP 5xx, `ServiceException`)
    #[error("Service error: {0}")]
    Service(String),

    /// Network or connection error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Returns true if this error is transient and the call may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Throttled(_) | ClientError::Service(_) | ClientError::Transport(_)
        )
    }

    /// Returns true if the account or region cannot use the quota service at all
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ClientError::AccessDenied(_) | ClientError::UnsupportedRegion(_)
        )
    }
}

/// Record store errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ClientError::Throttled("x".to_string()).is_transient());
        assert!(ClientError::Service("x".to_string()).is_transient());
        assert!(ClientError::Transport("x".to_string()).is_transient());
        assert!(!ClientError::NotFound("x".to_string()).is_transient());
        assert!(!ClientError::AccessDenied("x".to_string()).is_transient());
    }

    #[test]
    fn test_unavailable_errors() {
        assert!(ClientError::AccessDenied("x".to_string()).is_unavailable());
        assert!(ClientError::UnsupportedRegion("x".to_string()).is_unavailable());
        assert!(!ClientError::Service("x".to_string()).is_unavailable());
    }
}
