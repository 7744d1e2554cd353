//! Rule validation with structured errors and warnings.
//!
//! The authoring surface validates rules before they reach the engine, but
//! the reconciler re-runs these checks defensively so a malformed rule can
//! never materialize meaningless jobs. Returns a [`ValidationResult`] with
//! errors (block reconciliation) and warnings (advisory).

mod frequency_checks;
mod window_checks;

use serde::{Deserialize, Serialize};

use crate::schema::NotificationRule;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field-path-like location, e.g. `"windows[0].end"`.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Join error messages into one line for error-enum embedding.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a [`NotificationRule`].
pub fn validate_rule(rule: &NotificationRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    if rule.description.trim().is_empty() {
        result.warn("description", "rule has an empty description");
    }
    frequency_checks::validate_frequency(rule, &mut result);
    window_checks::validate_windows(rule, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FrequencyPolicy, RuleKind, TimeWindow};
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::new(
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    fn base_rule(frequency: FrequencyPolicy) -> NotificationRule {
        NotificationRule {
            id: Uuid::new_v4(),
            description: "Guard change report".to_string(),
            kind: RuleKind::Obligatory,
            frequency,
            windows: vec![window((8, 0), (9, 0))],
            single_day: None,
            days: Vec::new(),
            weekdays: Vec::new(),
            event_type_id: Uuid::new_v4(),
            audience_groups: vec![Uuid::new_v4()],
            is_active: true,
            materialized_jobs: Vec::new(),
        }
    }

    #[test]
    fn valid_every_day_rule_passes() {
        let result = validate_rule(&base_rule(FrequencyPolicy::EveryDay));
        assert!(result.valid, "errors: {}", result.summary());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn obligatory_rule_without_windows_is_invalid() {
        let mut rule = base_rule(FrequencyPolicy::EveryDay);
        rule.windows.clear();
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "windows");
    }

    #[test]
    fn recurrent_rule_without_windows_is_fine() {
        let mut rule = base_rule(FrequencyPolicy::EveryDay);
        rule.kind = RuleKind::Recurrent;
        rule.windows.clear();
        assert!(validate_rule(&rule).valid);
    }

    #[test]
    fn single_day_requires_day() {
        let rule = base_rule(FrequencyPolicy::SingleDay);
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "single_day");
    }

    #[test]
    fn single_day_with_day_passes() {
        let mut rule = base_rule(FrequencyPolicy::SingleDay);
        rule.single_day = NaiveDate::from_ymd_opt(2024, 1, 10);
        assert!(validate_rule(&rule).valid);
    }

    #[test]
    fn multiple_days_requires_days() {
        let rule = base_rule(FrequencyPolicy::MultipleDays);
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "days");
    }

    #[test]
    fn weekly_requires_weekdays() {
        let rule = base_rule(FrequencyPolicy::WeeklyByWeekday);
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "weekdays");
    }

    #[test]
    fn weekday_out_of_range_is_invalid() {
        let mut rule = base_rule(FrequencyPolicy::WeeklyByWeekday);
        rule.weekdays = vec![1, 7];
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert!(result.errors[0].message.contains("0-6"));
    }

    #[test]
    fn duplicate_weekdays_warn() {
        let mut rule = base_rule(FrequencyPolicy::WeeklyByWeekday);
        rule.weekdays = vec![1, 1, 3];
        let result = validate_rule(&rule);
        assert!(result.valid);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn stray_frequency_payload_warns() {
        let mut rule = base_rule(FrequencyPolicy::EveryDay);
        rule.single_day = NaiveDate::from_ymd_opt(2024, 1, 10);
        let result = validate_rule(&rule);
        assert!(result.valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "single_day"));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let mut rule = base_rule(FrequencyPolicy::EveryDay);
        rule.windows = vec![window((21, 0), (6, 0))];
        let result = validate_rule(&rule);
        assert!(!result.valid);
        assert!(result.errors[0].path.starts_with("windows[0]"));
    }

    #[test]
    fn empty_description_warns() {
        let mut rule = base_rule(FrequencyPolicy::EveryDay);
        rule.description = "  ".to_string();
        let result = validate_rule(&rule);
        assert!(result.valid);
        assert_eq!(result.warnings[0].path, "description");
    }
}
