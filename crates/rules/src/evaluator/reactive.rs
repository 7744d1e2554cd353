//! Reactive path for recurrent rules.
//!
//! Recurrent rules are never materialized into scheduled jobs; they fire the
//! moment a matching event is recorded. The surrounding application calls
//! [`ComplianceEvaluator::on_event_recorded`] from its report-creation path.

use tracing::{debug, info, warn};

use vigil_core::tenant::TenantScope;
use vigil_core::types::EventRecord;
use vigil_notify::Notification;

use crate::schema::RuleKind;
use crate::stores::StoreError;

use super::ComplianceEvaluator;

impl ComplianceEvaluator {
    /// Notify every active recurrent rule monitoring the recorded event's
    /// type. No window check, no location filter — the audience is the
    /// rule's groups in full. Returns the number of notifications sent.
    pub async fn on_event_recorded(
        &self,
        scope: &TenantScope,
        event: &EventRecord,
    ) -> Result<usize, StoreError> {
        let mut sent = 0;

        for rule in self.rules.list(scope).await? {
            if rule.kind != RuleKind::Recurrent
                || !rule.is_active
                || rule.event_type_id != event.event_type_id
            {
                continue;
            }

            let recipients = match self.groups.members_of(scope, &rule.audience_groups).await {
                Ok(members) => members,
                Err(e) => {
                    warn!(
                        tenant = %scope.tenant,
                        rule_id = %rule.id,
                        error = %e,
                        "audience resolution failed for recurrent rule"
                    );
                    continue;
                }
            };
            if recipients.is_empty() {
                debug!(
                    tenant = %scope.tenant,
                    rule_id = %rule.id,
                    "recurrent rule has no audience"
                );
                continue;
            }

            let subject = self.subject_for(scope, &rule).await;
            let mut notification =
                Notification::new(subject, rule.description.clone(), recipients);
            notification
                .metadata
                .insert("rule_id".to_string(), rule.id.to_string());
            notification
                .metadata
                .insert("tenant".to_string(), scope.tenant.to_string());

            self.dispatcher
                .dispatch(&rule.id.to_string(), &notification)
                .await;
            sent += 1;
        }

        if sent > 0 {
            info!(
                tenant = %scope.tenant,
                event_type_id = %event.event_type_id,
                notifications = sent,
                "recurrent notifications dispatched"
            );
        }
        Ok(sent)
    }
}
