//! Scheduled job entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_core::tenant::TenantId;

use crate::schema::RecurrenceDescriptor;

/// One concrete firing instruction derived from a rule.
///
/// The payload is the rule id alone — no denormalized rule fields — so the
/// evaluator always re-reads the rule at fire time and observes the latest
/// active flag and audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub owner_tenant: TenantId,
    pub rule_id: Uuid,
    pub recurrence: RecurrenceDescriptor,
    pub state: JobState,
    pub installed_at: DateTime<Utc>,
    pub last_fired: Option<DateTime<Utc>>,
}

impl ScheduledJob {
    pub fn is_one_off(&self) -> bool {
        self.recurrence.is_one_off()
    }
}

/// Registry state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Installed, waiting for its due instant.
    Pending,
    /// Claimed by the runtime; its evaluation is executing.
    Fired,
    /// Finished or force-removed; never re-armed.
    Retired,
}
