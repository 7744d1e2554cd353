//! Time-window sanity checks.

use crate::schema::NotificationRule;

use super::ValidationResult;

pub(super) fn validate_windows(rule: &NotificationRule, result: &mut ValidationResult) {
    for (i, window) in rule.windows.iter().enumerate() {
        // The evaluator checks [start, end] on the firing day, so an
        // overnight or zero-length window can never be satisfied.
        if window.end <= window.start {
            result.error(
                format!("windows[{i}].end"),
                format!(
                    "window end {} must be after start {}",
                    window.end.format("%H:%M"),
                    window.start.format("%H:%M")
                ),
            );
        }
    }
}
