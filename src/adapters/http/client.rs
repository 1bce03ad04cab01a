//! HTTP client for the Service Quotas JSON 1.1 API.
//!
//! Every operation is a `POST /` naming the operation in `X-Amz-Target`.
//! Request signing is left to the endpoint (typically a local signing
//! proxy); this client only speaks the wire format. A token bucket shared
//! by all clones keeps concurrent reconciliations under the configured
//! request rate.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::models::{
    ClientConfig, ObservedQuota, QuotaChangeRequest, QuotaIdentity, ServiceDescriptor,
};
use crate::domain::ports::{ClientError, QuotaServiceClient};

use super::wire::{
    classify_error, ChangeRequestKey, ErrorBody, HistoryRequest, HistoryResponse,
    IncreaseRequest, ListServicesRequest, ListServicesResponse, QuotaKey, QuotaResponse,
    RequestedQuotaResponse, CONTENT_TYPE, TARGET_PREFIX,
};

const LIST_SERVICES_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct HttpQuotaClient {
    http: Client,
    endpoint: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl HttpQuotaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("quotakeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            endpoint: config.resolved_endpoint().trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.limiter.until_ready().await;
        debug!(operation, "calling quota service");

        let payload = serde_json::to_vec(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self
            .http
            .post(format!("{}/", self.endpoint))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{operation}: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("{operation}: {e}")))?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let err = classify_error(status.as_u16(), &error);
            debug!(operation, status = status.as_u16(), error = %err, "quota service returned an error");
            return Err(err);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("{operation} response: {e}")))
    }
}

#[async_trait]
impl QuotaServiceClient for HttpQuotaClient {
    #[instrument(skip(self))]
    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, ClientError> {
        let mut services = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page: ListServicesResponse = self
                .call(
                    "ListServices",
                    &ListServicesRequest {
                        max_results: LIST_SERVICES_PAGE_SIZE,
                        next_token: next_token.as_deref(),
                    },
                )
                .await?;
            services.extend(page.services.into_iter().map(ServiceDescriptor::from));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(services)
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn get_quota(&self, identity: &QuotaIdentity) -> Result<ObservedQuota, ClientError> {
        let resp: QuotaResponse = self.call("GetServiceQuota", &QuotaKey::from(identity)).await?;
        resp.quota.try_into()
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn get_default_quota(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<ObservedQuota, ClientError> {
        let resp: QuotaResponse = self
            .call("GetAWSDefaultServiceQuota", &QuotaKey::from(identity))
            .await?;
        resp.quota.try_into()
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn request_increase(
        &self,
        identity: &QuotaIdentity,
        value: f64,
    ) -> Result<QuotaChangeRequest, ClientError> {
        let resp: RequestedQuotaResponse = self
            .call(
                "RequestServiceQuotaIncrease",
                &IncreaseRequest {
                    service_code: identity.service_code(),
                    quota_code: identity.quota_code(),
                    desired_value: value,
                },
            )
            .await?;
        resp.requested_quota.try_into()
    }

    #[instrument(skip(self))]
    async fn get_change_request(
        &self,
        request_id: &str,
    ) -> Result<QuotaChangeRequest, ClientError> {
        let resp: RequestedQuotaResponse = self
            .call(
                "GetRequestedServiceQuotaChange",
                &ChangeRequestKey { request_id },
            )
            .await?;
        resp.requested_quota.try_into()
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn list_open_requests(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<Vec<QuotaChangeRequest>, ClientError> {
        let mut open = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page: HistoryResponse = self
                .call(
                    "ListRequestedServiceQuotaChangeHistoryByQuota",
                    &HistoryRequest {
                        service_code: identity.service_code(),
                        quota_code: identity.quota_code(),
                        next_token: next_token.as_deref(),
                    },
                )
                .await?;
            for requested in page.requested_quotas {
                let request = QuotaChangeRequest::try_from(requested)?;
                if request.is_open() {
                    open.push(request);
                }
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(open)
    }
}
