//! Due-check helpers for cyclical and one-off jobs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tracing::warn;

use crate::registry::ScheduledJob;
use crate::schema::{CyclicalSpec, Firing};

/// Next fire instant of a cyclical spec strictly after `after`, computed in
/// the descriptor's timezone and returned in UTC.
pub(crate) fn next_cyclical_fire(
    spec: &CyclicalSpec,
    tz: Tz,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let expression = spec.to_cron_expression();
    let schedule = match Schedule::from_str(&expression) {
        Ok(s) => s,
        Err(e) => {
            warn!(cron = %expression, error = %e, "unparseable cron expression");
            return None;
        }
    };
    schedule
        .after(&after.with_timezone(&tz))
        .next()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Check whether a job is due at `now`.
///
/// A cyclical job is due if a scheduled tick falls between `last_fired`
/// (exclusive) and `now` (inclusive); a job that never fired counts ticks
/// from its installation instant, so a rule installed after today's window
/// closed does not fire until the next occurrence. A one-off job is due
/// once its fire instant has passed and it has never fired.
pub(crate) fn is_due(job: &ScheduledJob, now: DateTime<Utc>) -> bool {
    match &job.recurrence.firing {
        Firing::OneOff(_) => {
            if job.last_fired.is_some() {
                return false;
            }
            match job.recurrence.one_off_fire_instant() {
                Some(at) => at <= now,
                None => {
                    warn!(job_id = %job.id, "one-off fire instant unresolvable");
                    false
                }
            }
        }
        Firing::Cyclical(spec) => {
            let check_from = job.last_fired.unwrap_or(job.installed_at);
            match next_cyclical_fire(spec, job.recurrence.timezone, check_from) {
                Some(next) => next <= now,
                None => false,
            }
        }
    }
}
