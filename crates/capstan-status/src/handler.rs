//! The event handler: one lifecycle event in, one result out.
//!
//! Each invocation is an independent unit of execution with no shared
//! mutable in-process state; all coordination against concurrent,
//! duplicate, or out-of-order events happens through the store's
//! conditional writes. The handler performs no internal retries - every
//! fatal error is surfaced for the invoking infrastructure's own
//! retry/backoff policy (typically re-delivery of the event).

use std::sync::Arc;

use chrono::Utc;

use crate::changeset::change_set_for;
use crate::config::Config;
use crate::deployment::DeploymentKey;
use crate::error::Result;
use crate::event::{FinalState, TaskStateChangeEvent};
use crate::notifier::{
    ApplicationStatusEvent, STATUS_EVENT_NAME, StatusNotifier, application_channel,
};
use crate::promoter::StatusPromoter;
use crate::reconciler::{Reconciler, Reconciliation};
use crate::resolver::{CorrelationResolver, TaskDescriber};
use crate::store::{ApplicationStore, DeploymentStore};

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event's change-set was applied.
    Applied {
        /// The application status written, when the event was terminal.
        promoted: Option<&'static str>,
    },
    /// A newer version had already won; the event was dropped unapplied.
    IgnoredStale,
}

/// Handles task state change events end to end.
///
/// Constructed once per process with its collaborators injected and
/// passed by reference into each invocation.
pub struct StateChangeHandler {
    resolver: CorrelationResolver,
    reconciler: Reconciler,
    promoter: StatusPromoter,
    notifier: Option<Arc<dyn StatusNotifier>>,
    notification_source: String,
}

impl StateChangeHandler {
    /// Creates a handler over the orchestrator and store capabilities.
    #[must_use]
    pub fn new(
        describer: Arc<dyn TaskDescriber>,
        deployments: Arc<dyn DeploymentStore>,
        applications: Arc<dyn ApplicationStore>,
    ) -> Self {
        Self {
            resolver: CorrelationResolver::new(describer),
            reconciler: Reconciler::new(deployments),
            promoter: StatusPromoter::new(applications),
            notifier: None,
            notification_source: Config::default().notification_source,
        }
    }

    /// Attaches a notification sink. Without one, terminal promotions
    /// complete normally and the skipped notification is only logged.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn StatusNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Overrides the source tag stamped on outgoing notifications.
    #[must_use]
    pub fn with_notification_source(mut self, source: impl Into<String>) -> Self {
        self.notification_source = source.into();
        self
    }

    /// Handles one lifecycle event.
    ///
    /// Control flow: resolve the correlation identifiers from the task's
    /// tags, build the event's change-set, apply it conditionally, and -
    /// when the event is terminal and won - promote the outcome into the
    /// application's status and publish a best-effort notification.
    ///
    /// # Errors
    ///
    /// Returns correlation, precondition, and store errors as described
    /// in [`crate::error::Error`]; a stale event is a normal
    /// [`Outcome::IgnoredStale`], not an error.
    #[tracing::instrument(
        skip(self, event),
        fields(
            task_arn = %event.detail.task_arn,
            version = event.detail.version,
            last_status = %event.detail.last_status
        )
    )]
    pub async fn handle(&self, event: &TaskStateChangeEvent) -> Result<Outcome> {
        let detail = &event.detail;

        let correlation = self
            .resolver
            .resolve(&detail.task_arn, &detail.cluster_arn)
            .await?;
        let key = DeploymentKey::new(correlation.application_id, correlation.deployment_id);

        let change = change_set_for(detail);
        match self.reconciler.reconcile(&key, &change).await? {
            Reconciliation::IgnoredStale { .. } => Ok(Outcome::IgnoredStale),
            Reconciliation::Applied => {
                let mut promoted = None;
                if let Some(state) = detail.final_state() {
                    let status = self.promoter.promote(&key.application_id, state).await?;
                    promoted = Some(status);
                    self.notify(&key, status, state).await;
                }
                Ok(Outcome::Applied { promoted })
            }
        }
    }

    /// Publishes the status event for a terminal promotion. Best-effort:
    /// failures are logged and never escalate.
    async fn notify(&self, key: &DeploymentKey, status: &str, state: FinalState) {
        let Some(notifier) = &self.notifier else {
            tracing::warn!("no status notifier configured");
            return;
        };

        let channel = application_channel(&key.application_id);
        let event = ApplicationStatusEvent {
            application_id: key.application_id.clone(),
            deployment_id: key.deployment_id.clone(),
            status: status.to_string(),
            time: Some(Utc::now()),
            is_error: state.errored,
            source: self.notification_source.clone(),
        };
        if let Err(error) = notifier.publish(&channel, STATUS_EVENT_NAME, &event).await {
            tracing::warn!(
                channel,
                status,
                %error,
                "failed to publish application status event"
            );
        }
    }
}
