//! Frequency-policy payload checks.

use std::collections::HashSet;

use crate::schema::{FrequencyPolicy, NotificationRule, RuleKind};

use super::ValidationResult;

pub(super) fn validate_frequency(rule: &NotificationRule, result: &mut ValidationResult) {
    if rule.kind == RuleKind::Obligatory && rule.windows.is_empty() {
        result.error(
            "windows",
            "an obligatory rule needs at least one time window",
        );
    }

    match rule.frequency {
        FrequencyPolicy::EveryDay => {}
        FrequencyPolicy::SingleDay => {
            if rule.single_day.is_none() {
                result.error("single_day", "single_day frequency requires a day");
            }
        }
        FrequencyPolicy::MultipleDays => {
            if rule.days.is_empty() {
                result.error("days", "multiple_days frequency requires at least one day");
            }
        }
        FrequencyPolicy::WeeklyByWeekday => {
            if rule.weekdays.is_empty() {
                result.error(
                    "weekdays",
                    "weekly_by_weekday frequency requires at least one weekday",
                );
            }
            for day in &rule.weekdays {
                if *day > 6 {
                    result.error("weekdays", format!("weekday {day} out of range 0-6"));
                }
            }
            let unique: HashSet<u8> = rule.weekdays.iter().copied().collect();
            if unique.len() != rule.weekdays.len() {
                result.warn("weekdays", "duplicate weekdays are collapsed");
            }
        }
    }

    // Payloads for other policies are ignored by the resolver; flag them so
    // authoring mistakes surface.
    if rule.frequency != FrequencyPolicy::SingleDay && rule.single_day.is_some() {
        result.warn(
            "single_day",
            format!("ignored under {} frequency", rule.frequency),
        );
    }
    if rule.frequency != FrequencyPolicy::MultipleDays && !rule.days.is_empty() {
        result.warn("days", format!("ignored under {} frequency", rule.frequency));
    }
    if rule.frequency != FrequencyPolicy::WeeklyByWeekday && !rule.weekdays.is_empty() {
        result.warn(
            "weekdays",
            format!("ignored under {} frequency", rule.frequency),
        );
    }
}
