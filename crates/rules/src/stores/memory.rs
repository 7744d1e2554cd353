//! In-memory reference implementations of the collaborator seams.
//!
//! Each store keys its data by tenant, mirroring the schema-per-tenant
//! isolation of the real deployment: a scope only ever sees its own slice.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use vigil_core::tenant::{TenantId, TenantScope};
use vigil_core::types::{EventRecord, EventType, Location, Recipient};

use crate::schema::NotificationRule;

use super::{
    EventStore, EventTypeDirectory, GroupDirectory, LocationDirectory, RuleStore, StoreError,
};

// ── Rules ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<TenantId, HashMap<Uuid, NotificationRule>>>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a rule in the tenant's scope (authoring stand-in).
    pub async fn upsert(&self, scope: &TenantScope, rule: NotificationRule) {
        self.rules
            .write()
            .await
            .entry(scope.tenant.clone())
            .or_default()
            .insert(rule.id, rule);
    }

    /// Remove a rule entirely (authoring stand-in).
    pub async fn delete(&self, scope: &TenantScope, rule_id: Uuid) {
        if let Some(tenant_rules) = self.rules.write().await.get_mut(&scope.tenant) {
            tenant_rules.remove(&rule_id);
        }
    }
}

#[async_trait::async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn get(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
    ) -> Result<Option<NotificationRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .get(&scope.tenant)
            .and_then(|rules| rules.get(&rule_id))
            .cloned())
    }

    async fn list(&self, scope: &TenantScope) -> Result<Vec<NotificationRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .get(&scope.tenant)
            .map(|rules| rules.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_materialized_jobs(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
        jobs: Vec<Uuid>,
    ) -> Result<(), StoreError> {
        let mut all = self.rules.write().await;
        let rule = all
            .get_mut(&scope.tenant)
            .and_then(|rules| rules.get_mut(&rule_id))
            .ok_or_else(|| StoreError::Other(format!("rule not found: {rule_id}")))?;
        rule.materialized_jobs = jobs;
        Ok(())
    }
}

// ── Events ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<TenantId, Vec<EventRecord>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filed report to the tenant's log.
    pub async fn record(&self, scope: &TenantScope, event: EventRecord) {
        self.events
            .write()
            .await
            .entry(scope.tenant.clone())
            .or_default()
            .push(event);
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn exists(
        &self,
        scope: &TenantScope,
        event_type_id: Uuid,
        location_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .get(&scope.tenant)
            .map(|events| {
                events.iter().any(|e| {
                    e.event_type_id == event_type_id
                        && e.location_id == location_id
                        && e.created_at >= from
                        && e.created_at <= to
                })
            })
            .unwrap_or(false))
    }
}

// ── Locations ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryLocationDirectory {
    locations: Arc<RwLock<HashMap<TenantId, Vec<Location>>>>,
}

impl InMemoryLocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, scope: &TenantScope, location: Location) {
        self.locations
            .write()
            .await
            .entry(scope.tenant.clone())
            .or_default()
            .push(location);
    }
}

#[async_trait::async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn list_active(&self, scope: &TenantScope) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .locations
            .read()
            .await
            .get(&scope.tenant)
            .map(|locations| {
                locations
                    .iter()
                    .filter(|l| l.is_active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ── Groups ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryGroupDirectory {
    members: Arc<RwLock<HashMap<TenantId, HashMap<Uuid, Vec<Recipient>>>>>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_member(&self, scope: &TenantScope, group_id: Uuid, recipient: Recipient) {
        self.members
            .write()
            .await
            .entry(scope.tenant.clone())
            .or_default()
            .entry(group_id)
            .or_default()
            .push(recipient);
    }
}

#[async_trait::async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn members_of(
        &self,
        scope: &TenantScope,
        group_ids: &[Uuid],
    ) -> Result<Vec<Recipient>, StoreError> {
        let members = self.members.read().await;
        let Some(groups) = members.get(&scope.tenant) else {
            return Ok(Vec::new());
        };

        // Deduplicate members present in several groups.
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for group_id in group_ids {
            for recipient in groups.get(group_id).into_iter().flatten() {
                if seen.insert(recipient.id) {
                    result.push(recipient.clone());
                }
            }
        }
        Ok(result)
    }
}

// ── Event types ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryEventTypeDirectory {
    types: Arc<RwLock<HashMap<TenantId, HashMap<Uuid, EventType>>>>,
}

impl InMemoryEventTypeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, scope: &TenantScope, event_type: EventType) {
        self.types
            .write()
            .await
            .entry(scope.tenant.clone())
            .or_default()
            .insert(event_type.id, event_type);
    }
}

#[async_trait::async_trait]
impl EventTypeDirectory for InMemoryEventTypeDirectory {
    async fn get(
        &self,
        scope: &TenantScope,
        event_type_id: Uuid,
    ) -> Result<Option<EventType>, StoreError> {
        Ok(self
            .types
            .read()
            .await
            .get(&scope.tenant)
            .and_then(|types| types.get(&event_type_id))
            .cloned())
    }
}
