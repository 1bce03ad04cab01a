//! Desired-state manifest.
//!
//! The manifest is the already-parsed desired-state document handed to the
//! engine: a flat list of quota declarations.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::identity::QuotaIdentity;
use super::quota::DesiredQuota;
use crate::domain::errors::{DomainError, DomainResult};

/// One declared quota, as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaDeclaration {
    pub service_code: String,
    pub quota_code: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<QuotaDeclaration>,
}

impl Manifest {
    pub fn from_yaml(source: &str) -> DomainResult<Self> {
        serde_yaml::from_str(source)
            .map_err(|e| DomainError::InvalidDesiredState(format!("manifest: {e}")))
    }

    /// Validate every declaration and reject duplicate identities.
    pub fn desired(&self) -> DomainResult<Vec<DesiredQuota>> {
        let mut seen = HashSet::new();
        let mut desired = Vec::with_capacity(self.resources.len());

        for decl in &self.resources {
            let identity = QuotaIdentity::new(&decl.service_code, &decl.quota_code)?;
            if !seen.insert(identity.clone()) {
                return Err(DomainError::InvalidDesiredState(format!(
                    "{identity} is declared more than once"
                )));
            }
            desired.push(DesiredQuota::new(identity, decl.value)?);
        }

        Ok(desired)
    }
}
