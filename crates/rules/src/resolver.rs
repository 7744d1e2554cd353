//! Recurrence resolver: frequency policy → firing descriptors.
//!
//! Pure translation of a rule's frequency policy and time windows into
//! [`RecurrenceDescriptor`] values. Nothing here touches the registry; the
//! reconciler feeds the output to the materializer.

use chrono::Timelike;
use chrono_tz::Tz;

use crate::schema::{
    CyclicalSpec, Firing, FrequencyPolicy, NotificationRule, RecurrenceDescriptor, TimeWindow,
};

/// A rule whose frequency payload is missing cannot be resolved. Validation
/// catches these upstream; the resolver still refuses them so no caller can
/// materialize meaningless jobs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("single_day frequency requires a day")]
    MissingSingleDay,

    #[error("multiple_days frequency requires at least one day")]
    MissingDays,

    #[error("weekly_by_weekday frequency requires at least one weekday")]
    MissingWeekdays,

    #[error("weekday {0} out of range 0-6")]
    WeekdayOutOfRange(u8),
}

/// Resolve a rule into one descriptor per (window × day) combination.
///
/// Every descriptor fires at its window's end time — the moment the expected
/// report is definitively overdue. Empty `windows` yields an empty result
/// (the rule is inert; rejecting that is the caller's job).
pub fn resolve(rule: &NotificationRule, tz: Tz) -> Result<Vec<RecurrenceDescriptor>, ResolveError> {
    let descriptors = match rule.frequency {
        FrequencyPolicy::EveryDay => rule
            .windows
            .iter()
            .map(|w| cyclical(w, tz, None))
            .collect(),

        FrequencyPolicy::SingleDay => {
            let day = rule.single_day.ok_or(ResolveError::MissingSingleDay)?;
            rule.windows
                .iter()
                .map(|w| one_off(w, tz, day))
                .collect()
        }

        FrequencyPolicy::MultipleDays => {
            if rule.days.is_empty() {
                return Err(ResolveError::MissingDays);
            }
            rule.days
                .iter()
                .flat_map(|day| rule.windows.iter().map(move |w| one_off(w, tz, *day)))
                .collect()
        }

        FrequencyPolicy::WeeklyByWeekday => {
            if rule.weekdays.is_empty() {
                return Err(ResolveError::MissingWeekdays);
            }
            if let Some(bad) = rule.weekdays.iter().find(|d| **d > 6) {
                return Err(ResolveError::WeekdayOutOfRange(*bad));
            }
            let days = rule.weekdays.iter().copied().collect();
            rule.windows
                .iter()
                .map(|w| cyclical(w, tz, Some(&days)))
                .collect()
        }
    };

    Ok(descriptors)
}

fn cyclical(
    window: &TimeWindow,
    tz: Tz,
    weekdays: Option<&std::collections::BTreeSet<u8>>,
) -> RecurrenceDescriptor {
    RecurrenceDescriptor {
        window: window.clone(),
        timezone: tz,
        firing: Firing::Cyclical(CyclicalSpec {
            minute: window.end.minute(),
            hour: window.end.hour(),
            weekdays: weekdays.cloned(),
        }),
    }
}

fn one_off(window: &TimeWindow, tz: Tz, day: chrono::NaiveDate) -> RecurrenceDescriptor {
    RecurrenceDescriptor {
        window: window.clone(),
        timezone: tz,
        firing: Firing::OneOff(day.and_time(window.end)),
    }
}
