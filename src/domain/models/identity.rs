//! Quota identity and its single-token encoding.
//!
//! A quota is addressed by a service code and a quota code, both opaque
//! tokens assigned by the remote system. The pair is persisted and
//! imported as `"<service_code>/<quota_code>"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::{DomainError, DomainResult};

/// Separator between service code and quota code in an encoded identity.
pub const IDENTITY_SEPARATOR: char = '/';

/// Compound key of a quota resource. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IdentityParts")]
pub struct QuotaIdentity {
    service_code: String,
    quota_code: String,
}

#[derive(Deserialize)]
struct IdentityParts {
    service_code: String,
    quota_code: String,
}

impl TryFrom<IdentityParts> for QuotaIdentity {
    type Error = DomainError;

    fn try_from(parts: IdentityParts) -> Result<Self, Self::Error> {
        Self::new(parts.service_code, parts.quota_code)
    }
}

impl QuotaIdentity {
    /// Build an identity; both codes must be non-empty and free of the separator.
    pub fn new(service_code: impl Into<String>, quota_code: impl Into<String>) -> DomainResult<Self> {
        let service_code = service_code.into();
        let quota_code = quota_code.into();

        for (field, value) in [("service_code", &service_code), ("quota_code", &quota_code)] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidDesiredState(format!(
                    "{field} must not be empty"
                )));
            }
            if value.contains(IDENTITY_SEPARATOR) {
                return Err(DomainError::InvalidDesiredState(format!(
                    "{field} '{value}' must not contain '{IDENTITY_SEPARATOR}'"
                )));
            }
        }

        Ok(Self {
            service_code,
            quota_code,
        })
    }

    pub fn service_code(&self) -> &str {
        &self.service_code
    }

    pub fn quota_code(&self) -> &str {
        &self.quota_code
    }

    /// Encode as `"<service_code>/<quota_code>"`.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.service_code, IDENTITY_SEPARATOR, self.quota_code
        )
    }

    /// Decode an import token.
    ///
    /// Fails with [`DomainError::MalformedIdentity`] unless the token splits
    /// on the separator into exactly two parts that [`QuotaIdentity::new`]
    /// accepts.
    pub fn decode(token: &str) -> DomainResult<Self> {
        let malformed = |reason: &str| DomainError::MalformedIdentity {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = token.split(IDENTITY_SEPARATOR).collect();
        match parts.as_slice() {
            [_] => Err(malformed("expected <service_code>/<quota_code>")),
            [service_code, quota_code] => {
                Self::new(*service_code, *quota_code).map_err(|err| match err {
                    DomainError::InvalidDesiredState(reason) => malformed(&reason),
                    other => other,
                })
            }
            _ => Err(malformed("too many separators")),
        }
    }
}

impl fmt::Display for QuotaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for QuotaIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
