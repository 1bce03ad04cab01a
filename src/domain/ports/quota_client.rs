use async_trait::async_trait;

use crate::domain::models::{
    ObservedQuota, QuotaChangeRequest, QuotaIdentity, ServiceDescriptor,
};
use crate::domain::ports::errors::ClientError;

/// Port for the remote quota service.
///
/// Implementations are shared read-only between concurrent
/// reconciliations, so every method takes `&self`.
#[async_trait]
pub trait QuotaServiceClient: Send + Sync {
    /// List the services that expose quotas. Also serves as the capability probe.
    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, ClientError>;

    /// Get the account-applied value of a quota.
    ///
    /// Returns `ClientError::NotFound` when no applied value exists.
    async fn get_quota(&self, identity: &QuotaIdentity) -> Result<ObservedQuota, ClientError>;

    /// Get the service default for a quota.
    async fn get_default_quota(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<ObservedQuota, ClientError>;

    /// Submit an increase request. Returns the created request, normally PENDING.
    async fn request_increase(
        &self,
        identity: &QuotaIdentity,
        value: f64,
    ) -> Result<QuotaChangeRequest, ClientError>;

    /// Get the current state of an increase request.
    async fn get_change_request(&self, request_id: &str)
        -> Result<QuotaChangeRequest, ClientError>;

    /// Increase requests for this quota that have not reached a terminal status.
    async fn list_open_requests(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<Vec<QuotaChangeRequest>, ClientError>;
}
