//! Compliance evaluator: the payload executed when a job fires.
//!
//! Re-enters the owning tenant's data scope, re-reads the rule, and checks
//! every active location for a qualifying event inside the schedule window
//! on the evaluation day. Locations with no event get an escalation fanned
//! out to the rule's audience groups, filtered to superusers and members
//! assigned to the failing location.
//!
//! A firing must never crash the scheduler runtime: missing rules and
//! locations are logged and swallowed, and a failure at one location never
//! blocks evaluation of the next.

mod reactive;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use vigil_core::tenant::TenantScope;
use vigil_core::types::Recipient;
use vigil_notify::{Dispatcher, Notification};

use crate::schema::{local_instant, NotificationRule, TimeWindow};
use crate::stores::{
    EventStore, EventTypeDirectory, GroupDirectory, LocationDirectory, RuleStore, StoreError,
};

/// What one evaluation did, for runtime logs and the manual trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOutcome {
    pub locations_checked: usize,
    pub escalations: usize,
    pub failures: usize,
}

/// Fire-time compliance check and escalation fan-out.
pub struct ComplianceEvaluator {
    rules: Arc<dyn RuleStore>,
    events: Arc<dyn EventStore>,
    locations: Arc<dyn LocationDirectory>,
    groups: Arc<dyn GroupDirectory>,
    event_types: Arc<dyn EventTypeDirectory>,
    dispatcher: Arc<Dispatcher>,
}

impl ComplianceEvaluator {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        events: Arc<dyn EventStore>,
        locations: Arc<dyn LocationDirectory>,
        groups: Arc<dyn GroupDirectory>,
        event_types: Arc<dyn EventTypeDirectory>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            rules,
            events,
            locations,
            groups,
            event_types,
            dispatcher,
        }
    }

    /// Evaluate one rule against one schedule window at `now`.
    ///
    /// The window's wall-clock bounds are pinned to "today" in the tenant's
    /// timezone. A rule that vanished or was disabled since materialization
    /// is a logged no-op.
    pub async fn evaluate(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<EvalOutcome, StoreError> {
        let Some(rule) = self.rules.get(scope, rule_id).await? else {
            info!(tenant = %scope.tenant, %rule_id, "rule no longer exists, skipping evaluation");
            return Ok(EvalOutcome::default());
        };
        if !rule.is_active {
            debug!(tenant = %scope.tenant, %rule_id, "rule is inactive, skipping evaluation");
            return Ok(EvalOutcome::default());
        }

        let today = now.with_timezone(&scope.timezone).date_naive();
        let (Some(from), Some(to)) = (
            local_instant(scope.timezone, today.and_time(window.start)),
            local_instant(scope.timezone, today.and_time(window.end)),
        ) else {
            warn!(
                tenant = %scope.tenant,
                %rule_id,
                window = %window,
                "window bounds unresolvable in tenant timezone, skipping evaluation"
            );
            return Ok(EvalOutcome::default());
        };

        let subject = self.subject_for(scope, &rule).await;
        let mut outcome = EvalOutcome::default();

        for location in self.locations.list_active(scope).await? {
            outcome.locations_checked += 1;

            let fulfilled = match self
                .events
                .exists(scope, rule.event_type_id, location.id, from, to)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        tenant = %scope.tenant,
                        %rule_id,
                        location_id = %location.id,
                        window = %window,
                        error = %e,
                        "event store query failed, continuing with next location"
                    );
                    outcome.failures += 1;
                    continue;
                }
            };

            if fulfilled {
                debug!(
                    tenant = %scope.tenant,
                    %rule_id,
                    location = %location.name,
                    window = %window,
                    "compliance satisfied"
                );
                continue;
            }

            let members = match self.groups.members_of(scope, &rule.audience_groups).await {
                Ok(members) => members,
                Err(e) => {
                    warn!(
                        tenant = %scope.tenant,
                        %rule_id,
                        location_id = %location.id,
                        error = %e,
                        "audience resolution failed, continuing with next location"
                    );
                    outcome.failures += 1;
                    continue;
                }
            };
            let recipients: Vec<Recipient> = members
                .into_iter()
                .filter(|m| m.covers_location(location.id))
                .collect();
            if recipients.is_empty() {
                warn!(
                    tenant = %scope.tenant,
                    %rule_id,
                    location = %location.name,
                    "compliance failure has no audience, nothing to send"
                );
                continue;
            }

            let body = format!("{} - NOT FULFILLED AT {}", rule.description, location.name);
            let mut notification = Notification::new(subject.clone(), body, recipients);
            notification
                .metadata
                .insert("rule_id".to_string(), rule.id.to_string());
            notification
                .metadata
                .insert("location".to_string(), location.name.clone());
            notification
                .metadata
                .insert("window".to_string(), window.to_string());
            notification
                .metadata
                .insert("tenant".to_string(), scope.tenant.to_string());

            let results = self
                .dispatcher
                .dispatch(&rule.id.to_string(), &notification)
                .await;
            outcome.escalations += 1;
            outcome.failures += results.iter().filter(|r| !r.success).count();
        }

        info!(
            tenant = %scope.tenant,
            %rule_id,
            window = %window,
            locations = outcome.locations_checked,
            escalations = outcome.escalations,
            failures = outcome.failures,
            "evaluation complete"
        );
        Ok(outcome)
    }

    /// Operator surface: evaluate every window of a rule right now,
    /// bypassing the schedule. Evaluator semantics are unchanged — an
    /// inactive or missing rule still no-ops.
    pub async fn force_fire(
        &self,
        scope: &TenantScope,
        rule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<EvalOutcome>, StoreError> {
        let Some(rule) = self.rules.get(scope, rule_id).await? else {
            info!(tenant = %scope.tenant, %rule_id, "rule not found, nothing to force-fire");
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::with_capacity(rule.windows.len());
        for window in &rule.windows {
            outcomes.push(self.evaluate(scope, rule_id, window, now).await?);
        }
        Ok(outcomes)
    }

    /// Subject line: the event-type description, falling back to the rule
    /// description when the dictionary entry is missing.
    async fn subject_for(&self, scope: &TenantScope, rule: &NotificationRule) -> String {
        match self.event_types.get(scope, rule.event_type_id).await {
            Ok(Some(event_type)) => event_type.description,
            Ok(None) => {
                warn!(
                    tenant = %scope.tenant,
                    rule_id = %rule.id,
                    event_type_id = %rule.event_type_id,
                    "event type not found, using rule description as subject"
                );
                rule.description.clone()
            }
            Err(e) => {
                warn!(
                    tenant = %scope.tenant,
                    rule_id = %rule.id,
                    error = %e,
                    "event type lookup failed, using rule description as subject"
                );
                rule.description.clone()
            }
        }
    }
}
