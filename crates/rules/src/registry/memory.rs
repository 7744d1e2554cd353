//! In-memory reference implementation of the job registry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use vigil_core::tenant::TenantId;

use super::{JobRegistry, JobState, RegistryError, ScheduledJob};

/// Shared-map registry. Good for tests and single-process deployments; a
/// database-backed implementation slots in behind the same trait.
#[derive(Default)]
pub struct InMemoryRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, ScheduledJob>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total job count across all tenants (test helper).
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

/// Check ownership before mutating; every write path goes through this.
fn check_owner(job: &ScheduledJob, tenant: &TenantId) -> Result<(), RegistryError> {
    if &job.owner_tenant != tenant {
        return Err(RegistryError::WrongTenant {
            job: job.id,
            tenant: tenant.clone(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl JobRegistry for InMemoryRegistry {
    async fn insert(&self, job: ScheduledJob) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn remove(&self, tenant: &TenantId, job_id: Uuid) -> Result<bool, RegistryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get(&job_id) {
            None => Ok(false),
            Some(job) => {
                check_owner(job, tenant)?;
                jobs.remove(&job_id);
                Ok(true)
            }
        }
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<ScheduledJob>, RegistryError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn pending_snapshot(&self) -> Result<Vec<ScheduledJob>, RegistryError> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.state == JobState::Pending)
            .cloned()
            .collect())
    }

    async fn jobs_for_tenant(&self, tenant: &TenantId) -> Result<Vec<ScheduledJob>, RegistryError> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| &j.owner_tenant == tenant)
            .cloned()
            .collect())
    }

    async fn mark_fired(
        &self,
        tenant: &TenantId,
        job_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(RegistryError::NotFound(job_id))?;
        check_owner(job, tenant)?;
        if job.state != JobState::Pending {
            return Err(RegistryError::InvalidTransition {
                job: job_id,
                from: job.state,
                to: JobState::Fired,
            });
        }
        job.state = JobState::Fired;
        job.last_fired = Some(at);
        Ok(())
    }

    async fn complete_cycle(&self, tenant: &TenantId, job_id: Uuid) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(RegistryError::NotFound(job_id))?;
        check_owner(job, tenant)?;
        if job.state != JobState::Fired {
            return Err(RegistryError::InvalidTransition {
                job: job_id,
                from: job.state,
                to: JobState::Pending,
            });
        }
        job.state = JobState::Pending;
        Ok(())
    }

    async fn retire(&self, tenant: &TenantId, job_id: Uuid) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get(&job_id).ok_or(RegistryError::NotFound(job_id))?;
        check_owner(job, tenant)?;
        if job.state != JobState::Fired {
            return Err(RegistryError::InvalidTransition {
                job: job_id,
                from: job.state,
                to: JobState::Retired,
            });
        }
        jobs.remove(&job_id);
        Ok(())
    }
}
