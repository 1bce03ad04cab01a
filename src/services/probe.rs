//! Capability probe run before any reconciliation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ServiceDescriptor;
use crate::domain::ports::{ClientError, QuotaServiceClient};

/// Confirms the account and region can use the quota service.
pub struct CapabilityProbe {
    client: Arc<dyn QuotaServiceClient>,
}

impl CapabilityProbe {
    pub fn new(client: Arc<dyn QuotaServiceClient>) -> Self {
        Self { client }
    }

    /// List services as a cheap precondition check.
    ///
    /// Permission, unsupported-region, and missing-endpoint failures become
    /// [`DomainError::FeatureUnavailable`]; other client failures pass through.
    #[instrument(skip(self))]
    pub async fn check(&self) -> DomainResult<Vec<ServiceDescriptor>> {
        match self.client.list_services().await {
            Ok(services) => {
                info!(services = services.len(), "quota service available");
                Ok(services)
            }
            Err(source) if source.is_unavailable() || matches!(source, ClientError::NotFound(_)) => {
                warn!(error = %source, "quota service unavailable");
                Err(DomainError::FeatureUnavailable { source })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryQuotaClient;
    use crate::domain::errors::ErrorKind;

    #[tokio::test]
    async fn test_lists_services() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_service("vpc", "Amazon Virtual Private Cloud (Amazon VPC)").await;

        let services = CapabilityProbe::new(client).check().await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_code, "vpc");
    }

    #[tokio::test]
    async fn test_access_denied_is_unavailable() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client
            .fail_list_services(ClientError::AccessDenied("not authorized".to_string()))
            .await;

        let err = CapabilityProbe::new(client).check().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeatureUnavailable);
    }

    #[tokio::test]
    async fn test_throttling_passes_through() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client
            .fail_list_services(ClientError::Throttled("slow down".to_string()))
            .await;

        let err = CapabilityProbe::new(client).check().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Client);
    }
}
