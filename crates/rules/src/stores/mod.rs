//! Collaborator seams: the data stores and directories the engine reads.
//!
//! The surrounding application owns these (rules live behind its authoring
//! surface, events in its append-only report log, locations/groups in its
//! directories). The engine consumes them through async traits; the
//! in-memory implementations in [`memory`] back tests and single-process
//! deployments.

mod memory;

pub use memory::{
    InMemoryEventStore, InMemoryEventTypeDirectory, InMemoryGroupDirectory,
    InMemoryLocationDirectory, InMemoryRuleStore,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::tenant::TenantScope;
use vigil_core::types::{EventType, Location, Recipient};

use crate::schema::NotificationRule;

/// Errors from collaborator stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Rule persistence. `set_materialized_jobs` is called by the reconciler
/// alone; nothing else writes the mirror field.
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    async fn get(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
    ) -> Result<Option<NotificationRule>, StoreError>;

    async fn list(&self, scope: &TenantScope) -> Result<Vec<NotificationRule>, StoreError>;

    async fn set_materialized_jobs(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
        jobs: Vec<Uuid>,
    ) -> Result<(), StoreError>;
}

/// The append-only log of filed reports. The evaluator only ever asks
/// whether a qualifying record exists in a window — existence alone
/// satisfies compliance, no best-match selection.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    async fn exists(
        &self,
        scope: &TenantScope,
        event_type_id: Uuid,
        location_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Location directory (read-only).
#[async_trait::async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn list_active(&self, scope: &TenantScope) -> Result<Vec<Location>, StoreError>;
}

/// Group membership directory. Returns every member of the given groups;
/// the evaluator filters by superuser flag or location assignment.
#[async_trait::async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn members_of(
        &self,
        scope: &TenantScope,
        group_ids: &[Uuid],
    ) -> Result<Vec<Recipient>, StoreError>;
}

/// Event-type dictionary (subject lines come from its descriptions).
#[async_trait::async_trait]
pub trait EventTypeDirectory: Send + Sync {
    async fn get(
        &self,
        scope: &TenantScope,
        event_type_id: Uuid,
    ) -> Result<Option<EventType>, StoreError>;
}
