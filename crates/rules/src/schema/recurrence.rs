//! Recurrence descriptors: the resolver's output.
//!
//! A descriptor is either a cyclical firing description (minute/hour plus an
//! optional weekday constraint) or a one-off local fire instant. Descriptors
//! carry their timezone explicitly so the scheduling runtime never falls back
//! to a process-wide default, and they abstract over any particular scheduler
//! backend's native job objects.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::window::TimeWindow;

/// One firing specification derived from a rule's frequency policy and a
/// single time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceDescriptor {
    /// The window this descriptor checks; the evaluator receives it at fire
    /// time.
    pub window: TimeWindow,
    /// Tenant timezone all wall-clock fields are interpreted in.
    pub timezone: Tz,
    pub firing: Firing,
}

impl RecurrenceDescriptor {
    pub fn is_one_off(&self) -> bool {
        matches!(self.firing, Firing::OneOff(_))
    }

    /// The UTC instant a one-off descriptor fires at, `None` for cyclical
    /// descriptors.
    pub fn one_off_fire_instant(&self) -> Option<DateTime<Utc>> {
        match &self.firing {
            Firing::OneOff(local) => local_instant(self.timezone, *local),
            Firing::Cyclical(_) => None,
        }
    }
}

/// Cyclical vs. one-off firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Firing {
    Cyclical(CyclicalSpec),
    /// Local wall-clock fire instant (no zone; the descriptor's zone applies).
    OneOff(NaiveDateTime),
}

/// A cyclical firing description: fixed minute and hour, optionally
/// constrained to a set of weekdays (0 = Sunday .. 6 = Saturday).
/// Day-of-month is never constrained by the supported frequency policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclicalSpec {
    pub minute: u32,
    pub hour: u32,
    #[serde(default)]
    pub weekdays: Option<BTreeSet<u8>>,
}

/// Cron atoms for weekday numbers; named atoms sidestep the cron crate's
/// 1-based numeric day-of-week convention.
const WEEKDAY_ATOMS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

impl CyclicalSpec {
    /// Render the 6-field cron expression (`sec min hour dom month dow`)
    /// consumed by the `cron` crate.
    pub fn to_cron_expression(&self) -> String {
        let dow = match &self.weekdays {
            Some(days) if !days.is_empty() => days
                .iter()
                .filter_map(|d| WEEKDAY_ATOMS.get(*d as usize).copied())
                .collect::<Vec<_>>()
                .join(","),
            _ => "*".to_string(),
        };
        format!("0 {} {} * * {}", self.minute, self.hour, dow)
    }
}

/// Resolve a local wall-clock datetime in `tz` to a UTC instant.
///
/// Ambiguous local times (DST fold) resolve to the earliest instant. A local
/// time skipped by a DST jump resolves to the equivalent wall-clock one hour
/// later, the first representable instant after the gap.
pub fn local_instant(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
