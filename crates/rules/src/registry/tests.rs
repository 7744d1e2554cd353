//! Tests for the job registry state machine and tenant isolation.

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use vigil_core::tenant::TenantId;

use crate::schema::{CyclicalSpec, Firing, RecurrenceDescriptor, TimeWindow};

use super::{InMemoryRegistry, JobRegistry, JobState, RegistryError, ScheduledJob};

fn tenant(name: &str) -> TenantId {
    TenantId::new(name)
}

fn job_for(tenant_name: &str) -> ScheduledJob {
    ScheduledJob {
        id: Uuid::new_v4(),
        owner_tenant: tenant(tenant_name),
        rule_id: Uuid::new_v4(),
        recurrence: RecurrenceDescriptor {
            window: TimeWindow::new(
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ),
            timezone: chrono_tz::UTC,
            firing: Firing::Cyclical(CyclicalSpec {
                minute: 0,
                hour: 9,
                weekdays: None,
            }),
        },
        state: JobState::Pending,
        installed_at: Utc::now(),
        last_fired: None,
    }
}

#[tokio::test]
async fn insert_and_get() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    let fetched = registry.get(job.id).await.unwrap().unwrap();
    assert_eq!(fetched, job);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    assert!(registry.remove(&tenant("acme"), job.id).await.unwrap());
    assert!(!registry.remove(&tenant("acme"), job.id).await.unwrap());
    assert!(!registry.remove(&tenant("acme"), Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn remove_refuses_foreign_tenant() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    let err = registry.remove(&tenant("rival"), job.id).await.unwrap_err();
    assert!(matches!(err, RegistryError::WrongTenant { .. }));
    // Job survives the attempt.
    assert!(registry.get(job.id).await.unwrap().is_some());
}

#[tokio::test]
async fn mark_fired_transitions_and_records_time() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    let at = Utc::now();
    registry.mark_fired(&tenant("acme"), job.id, at).await.unwrap();

    let fired = registry.get(job.id).await.unwrap().unwrap();
    assert_eq!(fired.state, JobState::Fired);
    assert_eq!(fired.last_fired, Some(at));
}

#[tokio::test]
async fn mark_fired_twice_is_invalid() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    registry
        .mark_fired(&tenant("acme"), job.id, Utc::now())
        .await
        .unwrap();
    let err = registry
        .mark_fired(&tenant("acme"), job.id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidTransition { .. }));
}

#[tokio::test]
async fn complete_cycle_rearms_to_pending() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    let at = Utc::now();
    registry.mark_fired(&tenant("acme"), job.id, at).await.unwrap();
    registry.complete_cycle(&tenant("acme"), job.id).await.unwrap();

    let rearmed = registry.get(job.id).await.unwrap().unwrap();
    assert_eq!(rearmed.state, JobState::Pending);
    // last_fired is preserved for the next due-check.
    assert_eq!(rearmed.last_fired, Some(at));
}

#[tokio::test]
async fn complete_cycle_requires_fired_state() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    let err = registry
        .complete_cycle(&tenant("acme"), job.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidTransition { .. }));
}

#[tokio::test]
async fn retire_removes_fired_job() {
    let registry = InMemoryRegistry::new();
    let job = job_for("acme");
    registry.insert(job.clone()).await.unwrap();

    registry
        .mark_fired(&tenant("acme"), job.id, Utc::now())
        .await
        .unwrap();
    registry.retire(&tenant("acme"), job.id).await.unwrap();

    assert!(registry.get(job.id).await.unwrap().is_none());
}

#[tokio::test]
async fn pending_snapshot_excludes_fired_jobs() {
    let registry = InMemoryRegistry::new();
    let a = job_for("acme");
    let b = job_for("acme");
    registry.insert(a.clone()).await.unwrap();
    registry.insert(b.clone()).await.unwrap();

    registry
        .mark_fired(&tenant("acme"), a.id, Utc::now())
        .await
        .unwrap();

    let pending = registry.pending_snapshot().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, b.id);
}

#[tokio::test]
async fn jobs_for_tenant_filters_by_owner() {
    let registry = InMemoryRegistry::new();
    registry.insert(job_for("acme")).await.unwrap();
    registry.insert(job_for("acme")).await.unwrap();
    registry.insert(job_for("rival")).await.unwrap();

    assert_eq!(registry.jobs_for_tenant(&tenant("acme")).await.unwrap().len(), 2);
    assert_eq!(registry.jobs_for_tenant(&tenant("rival")).await.unwrap().len(), 1);
    assert_eq!(registry.len().await, 3);
}
