//! Notification rule: one declarative compliance policy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::TimeWindow;

/// One compliance policy: "a report of this event type must be filed during
/// these time windows, on these days".
///
/// `materialized_jobs` mirrors what is live in the job registry for this rule
/// at all times. The reconciler is its only writer; everything else treats it
/// as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRule {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub kind: RuleKind,
    #[serde(default)]
    pub frequency: FrequencyPolicy,
    /// Ordered wall-clock windows during which a qualifying event is expected.
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
    /// Required iff `frequency == SingleDay`.
    #[serde(default)]
    pub single_day: Option<NaiveDate>,
    /// Required (nonempty) iff `frequency == MultipleDays`.
    #[serde(default)]
    pub days: Vec<NaiveDate>,
    /// Weekday numbers 0-6, 0 = Sunday. Required (nonempty) iff
    /// `frequency == WeeklyByWeekday`.
    #[serde(default)]
    pub weekdays: Vec<u8>,
    /// Event type this rule monitors.
    pub event_type_id: Uuid,
    /// Groups whose members receive escalations.
    #[serde(default)]
    pub audience_groups: Vec<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Job ids currently installed in the registry for this rule.
    /// Written only by the reconciler; empty while the rule is inactive.
    #[serde(default)]
    pub materialized_jobs: Vec<Uuid>,
}

impl NotificationRule {
    /// Whether this rule produces scheduled jobs at all.
    pub fn is_schedulable(&self) -> bool {
        self.is_active && self.kind == RuleKind::Obligatory
    }
}

/// How a rule is triggered.
///
/// Recurrent rules fire reactively when a matching event is recorded;
/// only obligatory rules are materialized into scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    #[default]
    Recurrent,
    Obligatory,
}

/// Which days an obligatory rule's windows apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPolicy {
    #[default]
    EveryDay,
    SingleDay,
    MultipleDays,
    WeeklyByWeekday,
}

impl std::fmt::Display for FrequencyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyPolicy::EveryDay => write!(f, "every_day"),
            FrequencyPolicy::SingleDay => write!(f, "single_day"),
            FrequencyPolicy::MultipleDays => write!(f, "multiple_days"),
            FrequencyPolicy::WeeklyByWeekday => write!(f, "weekly_by_weekday"),
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}
