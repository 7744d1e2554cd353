//! Shared job registry with per-tenant isolation.
//!
//! The registry is logically global infrastructure holding every tenant's
//! scheduled jobs. Isolation is structural, not ambient: every job carries
//! its `owner_tenant` tag and every mutation names the acting tenant, so one
//! tenant's reconciliation can never touch another tenant's jobs.
//!
//! Job lifecycle: `Pending → Fired → (Pending | Retired)`. The reconciler may
//! force a pending job straight to retired; a retired job is removed and
//! never re-armed — a new job must be materialized instead.

mod job;
mod memory;

pub use job::{JobState, ScheduledJob};
pub use memory::InMemoryRegistry;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::tenant::TenantId;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("job {job} is not owned by tenant {tenant}")]
    WrongTenant { job: Uuid, tenant: TenantId },

    #[error("invalid transition for job {job}: {from:?} -> {to:?}")]
    InvalidTransition {
        job: Uuid,
        from: JobState,
        to: JobState,
    },

    #[error("registry storage failed: {0}")]
    Storage(String),
}

/// The shared store of scheduled jobs. Backends are swappable; the in-memory
/// implementation is the reference (persistence is owned elsewhere).
#[async_trait::async_trait]
pub trait JobRegistry: Send + Sync {
    /// Install a new pending job.
    async fn insert(&self, job: ScheduledJob) -> Result<(), RegistryError>;

    /// Retire a pending job, removing it. Returns `false` when the id is
    /// unknown (idempotent delete — missing ids are not an error). Refuses
    /// jobs owned by a different tenant.
    async fn remove(&self, tenant: &TenantId, job_id: Uuid) -> Result<bool, RegistryError>;

    async fn get(&self, job_id: Uuid) -> Result<Option<ScheduledJob>, RegistryError>;

    /// Snapshot of every pending job across all tenants (runtime read in the
    /// shared registry scope).
    async fn pending_snapshot(&self) -> Result<Vec<ScheduledJob>, RegistryError>;

    /// All jobs owned by one tenant.
    async fn jobs_for_tenant(&self, tenant: &TenantId) -> Result<Vec<ScheduledJob>, RegistryError>;

    /// `Pending → Fired`, recording the fire time. The claim step: a job a
    /// concurrent tick already claimed yields `InvalidTransition`.
    async fn mark_fired(
        &self,
        tenant: &TenantId,
        job_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// `Fired → Pending`: re-arm a cyclical job for its next occurrence.
    async fn complete_cycle(&self, tenant: &TenantId, job_id: Uuid) -> Result<(), RegistryError>;

    /// `Fired → Retired`: remove a finished one-off job.
    async fn retire(&self, tenant: &TenantId, job_id: Uuid) -> Result<(), RegistryError>;
}
