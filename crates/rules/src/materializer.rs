//! Job materializer: descriptors → concrete registry jobs.
//!
//! Pure construction; the reconciler owns the registry writes. Each job's
//! payload carries only the rule id so the evaluator re-reads the rule at
//! fire time instead of trusting a stale copy.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::tenant::TenantScope;

use crate::registry::{JobState, ScheduledJob};
use crate::schema::{NotificationRule, RecurrenceDescriptor};

/// Build pending jobs for every resolved descriptor, tagged with the owning
/// tenant. `now` becomes `installed_at` (passed in for determinism).
pub fn materialize(
    scope: &TenantScope,
    rule: &NotificationRule,
    descriptors: Vec<RecurrenceDescriptor>,
    now: DateTime<Utc>,
) -> Vec<ScheduledJob> {
    descriptors
        .into_iter()
        .map(|recurrence| ScheduledJob {
            id: Uuid::new_v4(),
            owner_tenant: scope.tenant.clone(),
            rule_id: rule.id,
            recurrence,
            state: JobState::Pending,
            installed_at: now,
            last_fired: None,
        })
        .collect()
}
