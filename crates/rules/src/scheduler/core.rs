//! [`SchedulerCore`] — claims due jobs and drives their evaluations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use vigil_core::tenant::TenantScope;

use crate::evaluator::ComplianceEvaluator;
use crate::registry::{JobRegistry, JobState, RegistryError, ScheduledJob};

use super::cron::is_due;

/// The scheduling runtime. [`run`](SchedulerCore::run) polls the registry;
/// [`claim_due`](SchedulerCore::claim_due) and [`fire`](SchedulerCore::fire)
/// are exposed separately so tests can drive a tick deterministically.
pub struct SchedulerCore {
    registry: Arc<dyn JobRegistry>,
    evaluator: Arc<ComplianceEvaluator>,
    /// Bound on a single evaluation; a job exceeding it is treated as failed.
    eval_timeout: Duration,
}

impl SchedulerCore {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        evaluator: Arc<ComplianceEvaluator>,
        eval_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            evaluator,
            eval_timeout,
        }
    }

    /// Claim every pending job due at `now` by moving it `Pending → Fired`.
    ///
    /// A job another tick claimed first loses the transition race and is
    /// skipped silently; the returned jobs are exclusively ours to fire.
    pub async fn claim_due(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let pending = match self.registry.pending_snapshot().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "registry snapshot failed, skipping tick");
                return Vec::new();
            }
        };

        let mut claimed = Vec::new();
        for mut job in pending.into_iter().filter(|j| is_due(j, now)) {
            match self.registry.mark_fired(&job.owner_tenant, job.id, now).await {
                Ok(()) => {
                    job.state = JobState::Fired;
                    job.last_fired = Some(now);
                    claimed.push(job);
                }
                Err(RegistryError::InvalidTransition { .. }) | Err(RegistryError::NotFound(_)) => {
                    debug!(job_id = %job.id, "job claimed by a concurrent tick");
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "failed to claim job");
                }
            }
        }

        if !claimed.is_empty() {
            info!(due = claimed.len(), "claimed due jobs");
        }
        claimed
    }

    /// Run one claimed job's evaluation to completion, then settle its
    /// registry state: cyclical jobs re-arm for the next occurrence, one-off
    /// jobs retire. Evaluation errors and timeouts are logged and swallowed
    /// — a firing must never take the runtime down.
    pub async fn fire(&self, job: ScheduledJob, now: DateTime<Utc>) {
        // The job carries everything needed to re-enter the tenant's scope:
        // its owner tag and the descriptor's timezone.
        let scope = TenantScope::new(job.owner_tenant.clone(), job.recurrence.timezone);

        let evaluation = tokio::time::timeout(
            self.eval_timeout,
            self.evaluator
                .evaluate(&scope, job.rule_id, &job.recurrence.window, now),
        )
        .await;

        match evaluation {
            Ok(Ok(outcome)) => {
                debug!(
                    job_id = %job.id,
                    rule_id = %job.rule_id,
                    escalations = outcome.escalations,
                    "job fired"
                );
            }
            Ok(Err(e)) => {
                if job.is_one_off() {
                    error!(
                        job_id = %job.id,
                        rule_id = %job.rule_id,
                        window = %job.recurrence.window,
                        error = %e,
                        "one-off evaluation failed; its instant has passed, not retried"
                    );
                } else {
                    warn!(
                        job_id = %job.id,
                        rule_id = %job.rule_id,
                        window = %job.recurrence.window,
                        error = %e,
                        "evaluation failed; will retry at the next occurrence"
                    );
                }
            }
            Err(_) => {
                warn!(
                    job_id = %job.id,
                    rule_id = %job.rule_id,
                    timeout_secs = self.eval_timeout.as_secs(),
                    one_off = job.is_one_off(),
                    "evaluation timed out"
                );
            }
        }

        let settle = if job.is_one_off() {
            self.registry.retire(&job.owner_tenant, job.id).await
        } else {
            self.registry.complete_cycle(&job.owner_tenant, job.id).await
        };
        if let Err(e) = settle {
            // The reconciler may have force-retired the job mid-flight.
            debug!(job_id = %job.id, error = %e, "job settled elsewhere");
        }
    }

    /// Poll loop: claim due jobs every `tick_interval` and spawn a task per
    /// firing. Runs until `shutdown` is notified; in-flight evaluations are
    /// left to finish on their own tasks.
    pub async fn run(self: Arc<Self>, tick_interval: Duration, shutdown: Arc<Notify>) {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(tick_secs = tick_interval.as_secs(), "scheduler loop started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    for job in self.claim_due(now).await {
                        let core = self.clone();
                        tokio::spawn(async move {
                            core.fire(job, now).await;
                        });
                    }
                }
                _ = shutdown.notified() => {
                    info!("scheduler loop shutting down");
                    break;
                }
            }
        }
    }
}
