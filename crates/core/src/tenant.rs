//! Tenant identity and explicit data-scope passing.
//!
//! The job registry is shared infrastructure; everything else lives inside a
//! tenant's data scope. Scopes are plain values threaded through reconciler
//! and evaluator calls: a function holds exactly the scope it was given and
//! drops it on return, so there is no process-global "current tenant" to
//! restore on error paths.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::VigilError;

/// Opaque tenant identity (the original deployment keyed tenants by schema
/// name, so this stays a string rather than a UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A tenant data scope: identity plus the tenant's configured timezone.
///
/// All wall-clock arithmetic for a tenant's rules happens in this zone;
/// nothing in the engine consults a process-wide default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant: TenantId,
    pub timezone: Tz,
}

impl TenantScope {
    pub fn new(tenant: impl Into<TenantId>, timezone: Tz) -> Self {
        Self {
            tenant: tenant.into(),
            timezone,
        }
    }

    /// Build a scope from a tenant id and an IANA timezone name.
    pub fn parse(tenant: impl Into<TenantId>, timezone: &str) -> Result<Self, VigilError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| VigilError::UnknownTimezone(timezone.to_string()))?;
        Ok(Self {
            tenant: tenant.into(),
            timezone: tz,
        })
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
