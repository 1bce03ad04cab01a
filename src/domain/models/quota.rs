//! Desired and observed quota state.

use serde::{Deserialize, Serialize};

use super::identity::QuotaIdentity;
use crate::domain::errors::{DomainError, DomainResult};

/// The user's declared target for a quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredQuota {
    pub identity: QuotaIdentity,
    pub value: f64,
}

impl DesiredQuota {
    /// Build a desired quota. The value must be finite and positive; whether
    /// it clears the service default is left to the remote service.
    pub fn new(identity: QuotaIdentity, value: f64) -> DomainResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::InvalidDesiredState(format!(
                "value for {identity} must be a positive number, got {value}"
            )));
        }
        Ok(Self { identity, value })
    }
}

/// A quota as currently enforced by the remote system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedQuota {
    pub identity: QuotaIdentity,
    /// Currently effective value; in-flight increases are not reflected
    pub value: f64,
    pub adjustable: bool,
    pub global_quota: bool,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// True when no account-level value exists and `value` is the service default
    #[serde(default)]
    pub is_default: bool,
}

impl ObservedQuota {
    /// Minimal observation, mostly useful for fakes and tests.
    pub fn new(identity: QuotaIdentity, value: f64) -> Self {
        Self {
            identity,
            value,
            adjustable: true,
            global_quota: false,
            unit: "None".to_string(),
            quota_name: None,
            service_name: None,
            arn: None,
            is_default: false,
        }
    }

    pub fn with_quota_name(mut self, name: impl Into<String>) -> Self {
        self.quota_name = Some(name.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// A service that exposes quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service_code: String,
    pub service_name: String,
}
