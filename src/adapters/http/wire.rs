//! Service Quotas JSON 1.1 payloads.
//!
//! Field names follow the remote API (PascalCase). These types stay inside
//! the HTTP adapter; callers only see domain models.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::{
    ObservedQuota, QuotaChangeRequest, QuotaIdentity, RequestStatus, ServiceDescriptor,
};
use crate::domain::ports::ClientError;

/// Prefix of the `X-Amz-Target` header.
pub const TARGET_PREFIX: &str = "ServiceQuotasV20190624";

/// Content type of every request and response.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuotaKey<'a> {
    pub service_code: &'a str,
    pub quota_code: &'a str,
}

impl<'a> From<&'a QuotaIdentity> for QuotaKey<'a> {
    fn from(identity: &'a QuotaIdentity) -> Self {
        Self {
            service_code: identity.service_code(),
            quota_code: identity.quota_code(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListServicesRequest<'a> {
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListServicesResponse {
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceInfo {
    pub service_code: String,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl From<ServiceInfo> for ServiceDescriptor {
    fn from(info: ServiceInfo) -> Self {
        Self {
            service_name: info.service_name.unwrap_or_else(|| info.service_code.clone()),
            service_code: info.service_code,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuotaResponse {
    pub quota: ServiceQuota,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceQuota {
    pub service_code: String,
    pub quota_code: String,
    pub value: f64,
    #[serde(default)]
    pub adjustable: bool,
    #[serde(default)]
    pub global_quota: bool,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quota_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub quota_arn: Option<String>,
}

impl TryFrom<ServiceQuota> for ObservedQuota {
    type Error = ClientError;

    fn try_from(quota: ServiceQuota) -> Result<Self, Self::Error> {
        let identity = QuotaIdentity::new(quota.service_code, quota.quota_code)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(ObservedQuota {
            identity,
            value: quota.value,
            adjustable: quota.adjustable,
            global_quota: quota.global_quota,
            unit: quota.unit.unwrap_or_else(|| "None".to_string()),
            quota_name: quota.quota_name,
            service_name: quota.service_name,
            arn: quota.quota_arn,
            is_default: false,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncreaseRequest<'a> {
    pub service_code: &'a str,
    pub quota_code: &'a str,
    pub desired_value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeRequestKey<'a> {
    pub request_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRequest<'a> {
    pub service_code: &'a str,
    pub quota_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestedQuotaResponse {
    pub requested_quota: RequestedQuota,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryResponse {
    #[serde(default)]
    pub requested_quotas: Vec<RequestedQuota>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestedQuota {
    pub id: String,
    pub service_code: String,
    pub quota_code: String,
    pub desired_value: f64,
    pub status: String,
    #[serde(default)]
    pub case_id: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub created: Option<f64>,
}

impl TryFrom<RequestedQuota> for QuotaChangeRequest {
    type Error = ClientError;

    fn try_from(requested: RequestedQuota) -> Result<Self, Self::Error> {
        let identity = QuotaIdentity::new(requested.service_code, requested.quota_code)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let status = RequestStatus::from_str(&requested.status).ok_or_else(|| {
            ClientError::Decode(format!("unknown request status '{}'", requested.status))
        })?;
        Ok(QuotaChangeRequest {
            id: requested.id,
            identity,
            desired_value: requested.desired_value,
            status,
            case_id: requested.case_id.filter(|id| !id.is_empty()),
            created: requested.created.and_then(epoch_to_datetime),
        })
    }
}

fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9) as u32;
    Utc.timestamp_opt(whole, nanos).single()
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Exception name without the namespace prefix.
    pub fn code(&self) -> Option<&str> {
        self.error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t))
    }
}

/// Classify a failed response by exception name, then by HTTP status.
pub fn classify_error(status: u16, body: &ErrorBody) -> ClientError {
    let message = match (body.code(), body.message.as_deref()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => format!("HTTP {status}"),
    };

    match body.code() {
        Some("NoSuchResourceException") => ClientError::NotFound(message),
        Some(
            "AccessDeniedException"
            | "DependencyAccessDeniedException"
            | "NoAvailableOrganizationException"
            | "AWSServiceAccessNotEnabledException",
        ) => ClientError::AccessDenied(message),
        Some("TemplatesNotAvailableInRegionException") => ClientError::UnsupportedRegion(message),
        Some("TooManyRequestsException" | "ThrottlingException") => ClientError::Throttled(message),
        Some("ServiceException") => ClientError::Service(message),
        Some(
            "IllegalArgumentException"
            | "InvalidPaginationTokenException"
            | "InvalidResourceStateException"
            | "QuotaExceededException"
            | "ResourceAlreadyExistsException",
        ) => ClientError::InvalidRequest(message),
        _ => match status {
            404 => ClientError::NotFound(message),
            401 | 403 => ClientError::AccessDenied(message),
            429 => ClientError::Throttled(message),
            500..=599 => ClientError::Service(message),
            _ => ClientError::InvalidRequest(message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strips_namespace() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"__type":"com.amazonaws.servicequotas#NoSuchResourceException","message":"gone"}"#,
        )
        .unwrap();
        assert_eq!(body.code(), Some("NoSuchResourceException"));
        assert_eq!(
            classify_error(400, &body),
            ClientError::NotFound("NoSuchResourceException: gone".to_string())
        );
    }

    #[test]
    fn test_status_fallback() {
        let body = ErrorBody::default();
        assert!(matches!(classify_error(503, &body), ClientError::Service(_)));
        assert!(matches!(classify_error(429, &body), ClientError::Throttled(_)));
        assert!(matches!(classify_error(403, &body), ClientError::AccessDenied(_)));
    }

    #[test]
    fn test_requested_quota_decodes() {
        let requested: RequestedQuota = serde_json::from_str(
            r#"{"Id":"abc","CaseId":"","ServiceCode":"vpc","QuotaCode":"L-F678F1CE",
                "DesiredValue":75.0,"Status":"CASE_OPENED","Created":1700000000.5}"#,
        )
        .unwrap();
        let request = QuotaChangeRequest::try_from(requested).unwrap();
        assert_eq!(request.status, RequestStatus::CaseOpened);
        assert!(request.case_id.is_none());
        assert_eq!(request.created.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let requested = RequestedQuota {
            id: "abc".to_string(),
            service_code: "vpc".to_string(),
            quota_code: "L-F678F1CE".to_string(),
            desired_value: 75.0,
            status: "WITHDRAWN".to_string(),
            case_id: None,
            created: None,
        };
        assert!(matches!(
            QuotaChangeRequest::try_from(requested),
            Err(ClientError::Decode(_))
        ));
    }
}
