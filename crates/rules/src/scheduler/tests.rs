//! Tests for the scheduler: due-checks and the claim/fire cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use vigil_core::tenant::{TenantId, TenantScope};
use vigil_core::types::{Location, Recipient};
use vigil_notify::{Dispatcher, Notification, Notifier, NotifyError};

use crate::evaluator::ComplianceEvaluator;
use crate::registry::{InMemoryRegistry, JobRegistry, JobState, ScheduledJob};
use crate::schema::{
    CyclicalSpec, Firing, FrequencyPolicy, NotificationRule, RecurrenceDescriptor, RuleKind,
    TimeWindow,
};
use crate::scheduler::cron::{is_due, next_cyclical_fire};
use crate::scheduler::SchedulerCore;
use crate::stores::{
    InMemoryEventStore, InMemoryEventTypeDirectory, InMemoryGroupDirectory,
    InMemoryLocationDirectory, InMemoryRuleStore, RuleStore,
};

fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
    TimeWindow::new(
        NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
    )
}

fn daily_job(tz: chrono_tz::Tz, hour: u32, minute: u32) -> ScheduledJob {
    ScheduledJob {
        id: Uuid::new_v4(),
        owner_tenant: TenantId::new("acme"),
        rule_id: Uuid::new_v4(),
        recurrence: RecurrenceDescriptor {
            window: window((hour.saturating_sub(1), minute), (hour, minute)),
            timezone: tz,
            firing: Firing::Cyclical(CyclicalSpec {
                minute,
                hour,
                weekdays: None,
            }),
        },
        state: JobState::Pending,
        installed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        last_fired: None,
    }
}

fn one_off_job(local: chrono::NaiveDateTime, tz: chrono_tz::Tz) -> ScheduledJob {
    ScheduledJob {
        id: Uuid::new_v4(),
        owner_tenant: TenantId::new("acme"),
        rule_id: Uuid::new_v4(),
        recurrence: RecurrenceDescriptor {
            window: window((8, 0), (9, 0)),
            timezone: tz,
            firing: Firing::OneOff(local),
        },
        state: JobState::Pending,
        installed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        last_fired: None,
    }
}

// ── next_cyclical_fire ──────────────────────────────────────

#[test]
fn next_fire_daily_in_utc() {
    let spec = CyclicalSpec {
        minute: 0,
        hour: 9,
        weekdays: None,
    };
    let after = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let next = next_cyclical_fire(&spec, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap());
}

#[test]
fn next_fire_respects_descriptor_timezone() {
    let spec = CyclicalSpec {
        minute: 0,
        hour: 9,
        weekdays: None,
    };
    // 09:00 in Caracas (UTC-4) is 13:00 UTC.
    let after = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    let next = next_cyclical_fire(&spec, chrono_tz::America::Caracas, after).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 10, 13, 0, 0).unwrap());
}

#[test]
fn next_fire_honors_weekday_constraint() {
    let spec = CyclicalSpec {
        minute: 0,
        hour: 9,
        // Monday only.
        weekdays: Some([1u8].into_iter().collect()),
    };
    // 2024-01-10 is a Wednesday; next Monday is 2024-01-15.
    let after = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    let next = next_cyclical_fire(&spec, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
}

// ── is_due ──────────────────────────────────────────────────

#[test]
fn cyclical_job_due_after_tick_passes() {
    let job = daily_job(chrono_tz::UTC, 9, 0);
    // Installed Jan 1; first tick after installation is Jan 1 09:00.
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 30).unwrap();
    assert!(is_due(&job, now));
}

#[test]
fn cyclical_job_not_due_before_first_tick() {
    let mut job = daily_job(chrono_tz::UTC, 9, 0);
    // Installed mid-morning after today's 09:00 already passed.
    job.installed_at = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    assert!(!is_due(&job, now), "must wait for tomorrow's occurrence");

    let tomorrow = Utc.with_ymd_and_hms(2024, 1, 11, 9, 0, 5).unwrap();
    assert!(is_due(&job, tomorrow));
}

#[test]
fn cyclical_job_respects_last_fired() {
    let mut job = daily_job(chrono_tz::UTC, 9, 0);
    job.last_fired = Some(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 10).unwrap());

    let later_same_day = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
    assert!(!is_due(&job, later_same_day));

    let next_day = Utc.with_ymd_and_hms(2024, 1, 11, 9, 0, 30).unwrap();
    assert!(is_due(&job, next_day));
}

#[test]
fn one_off_job_due_once_instant_passes() {
    let local = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let job = one_off_job(local, chrono_tz::UTC);

    assert!(!is_due(&job, Utc.with_ymd_and_hms(2024, 1, 10, 8, 59, 0).unwrap()));
    assert!(is_due(&job, Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()));
    assert!(is_due(&job, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
}

#[test]
fn one_off_job_never_due_twice() {
    let local = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let mut job = one_off_job(local, chrono_tz::UTC);
    job.last_fired = Some(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 5).unwrap());

    assert!(!is_due(&job, Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap()));
}

#[test]
fn one_off_due_instant_is_tenant_local() {
    let local = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let job = one_off_job(local, chrono_tz::America::Caracas); // fires 13:00 UTC

    assert!(!is_due(&job, Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()));
    assert!(is_due(&job, Utc.with_ymd_and_hms(2024, 1, 10, 13, 0, 0).unwrap()));
}

// ── claim/fire cycle ────────────────────────────────────────

struct CaptureNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait::async_trait]
impl Notifier for CaptureNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
    fn channel_name(&self) -> &str {
        "capture"
    }
}

struct RuntimeHarness {
    scope: TenantScope,
    registry: Arc<InMemoryRegistry>,
    rules: Arc<InMemoryRuleStore>,
    groups: Arc<InMemoryGroupDirectory>,
    locations: Arc<InMemoryLocationDirectory>,
    core: SchedulerCore,
    sent: Arc<Mutex<Vec<Notification>>>,
}

fn runtime_harness() -> RuntimeHarness {
    let scope = TenantScope::new("acme", chrono_tz::UTC);
    let registry = Arc::new(InMemoryRegistry::new());
    let rules = Arc::new(InMemoryRuleStore::new());
    let groups = Arc::new(InMemoryGroupDirectory::new());
    let locations = Arc::new(InMemoryLocationDirectory::new());
    let sent = Arc::new(Mutex::new(Vec::new()));

    let dispatcher = Arc::new(Dispatcher::with_defaults(vec![Box::new(CaptureNotifier {
        sent: sent.clone(),
    })]));
    let evaluator = Arc::new(ComplianceEvaluator::new(
        rules.clone(),
        Arc::new(InMemoryEventStore::new()),
        locations.clone(),
        groups.clone(),
        Arc::new(InMemoryEventTypeDirectory::new()),
        dispatcher,
    ));
    let core = SchedulerCore::new(registry.clone(), evaluator, Duration::from_secs(30));

    RuntimeHarness {
        scope,
        registry,
        rules,
        groups,
        locations,
        core,
        sent,
    }
}

async fn seed_rule(h: &RuntimeHarness, job: &ScheduledJob) {
    let group = Uuid::new_v4();
    let location = Location {
        id: Uuid::new_v4(),
        code: "157".to_string(),
        name: "North Gate".to_string(),
        is_active: true,
    };
    h.locations.add(&h.scope, location.clone()).await;
    h.groups
        .add_member(
            &h.scope,
            group,
            Recipient {
                id: Uuid::new_v4(),
                full_name: None,
                email: "guard@example.com".to_string(),
                is_superuser: false,
                location_ids: vec![location.id],
            },
        )
        .await;
    h.rules
        .upsert(
            &h.scope,
            NotificationRule {
                id: job.rule_id,
                description: "Guard change report".to_string(),
                kind: RuleKind::Obligatory,
                frequency: FrequencyPolicy::EveryDay,
                windows: vec![job.recurrence.window.clone()],
                single_day: None,
                days: Vec::new(),
                weekdays: Vec::new(),
                event_type_id: Uuid::new_v4(),
                audience_groups: vec![group],
                is_active: true,
                materialized_jobs: vec![job.id],
            },
        )
        .await;
}

#[tokio::test]
async fn claim_due_claims_exactly_once() {
    let h = runtime_harness();
    let job = daily_job(chrono_tz::UTC, 9, 0);
    h.registry.insert(job.clone()).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 30).unwrap();
    let first = h.core.claim_due(now).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].state, JobState::Fired);

    // Already fired; a second tick claims nothing.
    let second = h.core.claim_due(now).await;
    assert!(second.is_empty());
}

#[tokio::test]
async fn fired_cyclical_job_rearms_after_completion() {
    let h = runtime_harness();
    let job = daily_job(chrono_tz::UTC, 9, 0);
    seed_rule(&h, &job).await;
    h.registry.insert(job.clone()).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 30).unwrap();
    let claimed = h.core.claim_due(now).await.remove(0);
    h.core.fire(claimed, now).await;

    // No event was filed, so the escalation went out.
    assert_eq!(h.sent.lock().unwrap().len(), 1);

    // Back to pending with the fire time recorded.
    let settled = h.registry.get(job.id).await.unwrap().unwrap();
    assert_eq!(settled.state, JobState::Pending);
    assert_eq!(settled.last_fired, Some(now));

    // Not due again until tomorrow's occurrence.
    assert!(!is_due(&settled, now + chrono::Duration::hours(2)));
    assert!(is_due(&settled, now + chrono::Duration::days(1)));
}

#[tokio::test]
async fn fired_one_off_job_is_retired() {
    let h = runtime_harness();
    let local = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let job = one_off_job(local, chrono_tz::UTC);
    seed_rule(&h, &job).await;
    h.registry.insert(job.clone()).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 1, 0).unwrap();
    let claimed = h.core.claim_due(now).await.remove(0);
    h.core.fire(claimed, now).await;

    // Gone from the registry for good.
    assert!(h.registry.get(job.id).await.unwrap().is_none());
    assert_eq!(h.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn rule_disabled_after_materialization_noops_at_fire_time() {
    let h = runtime_harness();
    let job = daily_job(chrono_tz::UTC, 9, 0);
    seed_rule(&h, &job).await;
    h.registry.insert(job.clone()).await.unwrap();

    // Disable the rule between materialization and firing.
    let mut rule = h.rules.get(&h.scope, job.rule_id).await.unwrap().unwrap();
    rule.is_active = false;
    h.rules.upsert(&h.scope, rule).await;

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 30).unwrap();
    let claimed = h.core.claim_due(now).await.remove(0);
    h.core.fire(claimed, now).await;

    assert!(h.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn jobs_not_yet_due_are_left_alone() {
    let h = runtime_harness();
    let mut job = daily_job(chrono_tz::UTC, 9, 0);
    job.installed_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    h.registry.insert(job.clone()).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    assert!(h.core.claim_due(now).await.is_empty());

    let still_pending = h.registry.get(job.id).await.unwrap().unwrap();
    assert_eq!(still_pending.state, JobState::Pending);
}
