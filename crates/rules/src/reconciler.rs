//! Reconciler: keeps the registry consistent with rule state.
//!
//! Every rule create/update/disable runs the same full pass: retire whatever
//! was previously materialized, then rebuild the job set from scratch when
//! the rule is an active obligatory one. Rebuilding on updates that did not
//! touch scheduling fields is accepted cost; the pass is idempotent, so
//! re-running it for unchanged state converges on an equivalent job set.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vigil_core::tenant::TenantScope;

use crate::materializer;
use crate::registry::{JobRegistry, RegistryError, ScheduledJob};
use crate::resolver::{self, ResolveError};
use crate::schema::NotificationRule;
use crate::stores::{RuleStore, StoreError};
use crate::validation;

/// Errors surfaced synchronously to the rule-authoring caller.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Malformed rule input; rejected before any registry mutation.
    #[error("invalid rule: {0}")]
    Invalid(String),

    #[error("recurrence resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Registry write failed; partial writes from this attempt were rolled
    /// back and the rule's job mirror is unchanged. Retry the operation.
    #[error("registry write failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("rule store write failed: {0}")]
    Store(#[from] StoreError),
}

/// The only writer of `NotificationRule::materialized_jobs`.
pub struct Reconciler {
    registry: Arc<dyn JobRegistry>,
    rules: Arc<dyn RuleStore>,
}

impl Reconciler {
    pub fn new(registry: Arc<dyn JobRegistry>, rules: Arc<dyn RuleStore>) -> Self {
        Self { registry, rules }
    }

    /// Re-derive the rule's job set. Returns the new materialized job ids
    /// (empty when the rule is inactive or not obligatory).
    pub async fn reconcile(
        &self,
        scope: &TenantScope,
        rule: &NotificationRule,
    ) -> Result<Vec<Uuid>, ReconcileError> {
        let checked = validation::validate_rule(rule);
        if !checked.valid {
            return Err(ReconcileError::Invalid(checked.summary()));
        }
        for warning in &checked.warnings {
            warn!(rule_id = %rule.id, path = %warning.path, "{}", warning.message);
        }

        // Retire the previous job set. Missing ids are fine: a retried
        // reconciliation may have deleted them already.
        for job_id in &rule.materialized_jobs {
            let removed = self.registry.remove(&scope.tenant, *job_id).await?;
            if !removed {
                debug!(rule_id = %rule.id, %job_id, "stale job id already gone");
            }
        }

        let new_jobs = if rule.is_schedulable() {
            let descriptors = resolver::resolve(rule, scope.timezone)?;
            if descriptors.is_empty() {
                warn!(rule_id = %rule.id, "rule has no time windows; nothing to schedule");
            }
            let jobs = materializer::materialize(scope, rule, descriptors, Utc::now());
            self.install(scope, jobs).await?
        } else {
            Vec::new()
        };

        self.rules
            .set_materialized_jobs(scope, rule.id, new_jobs.clone())
            .await?;

        info!(
            tenant = %scope.tenant,
            rule_id = %rule.id,
            jobs = new_jobs.len(),
            "rule reconciled"
        );
        Ok(new_jobs)
    }

    /// Insert all jobs or none: a failed insert rolls back the jobs this
    /// attempt already installed before the error is returned.
    async fn install(
        &self,
        scope: &TenantScope,
        jobs: Vec<ScheduledJob>,
    ) -> Result<Vec<Uuid>, ReconcileError> {
        let mut installed: Vec<Uuid> = Vec::with_capacity(jobs.len());

        for job in jobs {
            let job_id = job.id;
            if let Err(e) = self.registry.insert(job).await {
                warn!(
                    tenant = %scope.tenant,
                    error = %e,
                    installed = installed.len(),
                    "job insertion failed mid-reconciliation, rolling back"
                );
                for rollback_id in &installed {
                    if let Err(rollback_err) =
                        self.registry.remove(&scope.tenant, *rollback_id).await
                    {
                        warn!(
                            tenant = %scope.tenant,
                            job_id = %rollback_id,
                            error = %rollback_err,
                            "rollback removal failed"
                        );
                    }
                }
                return Err(e.into());
            }
            installed.push(job_id);
        }

        Ok(installed)
    }
}
