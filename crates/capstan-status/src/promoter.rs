//! Promoting a terminal deployment outcome into the application's status.
//!
//! When a lifecycle event reports the terminal state, the deployment's
//! pass/fail outcome becomes the owning application's durable status.
//! The write is conditioned only on the application existing; an absent
//! record is a precondition violation surfaced to the caller, never
//! retried here.

use std::sync::Arc;

use capstan_core::ApplicationId;

use crate::error::{Error, Result};
use crate::event::FinalState;
use crate::store::{ApplicationStore, StatusUpdate};

/// Application status label for a successful deployment.
pub const STATUS_DEPLOYED: &str = "deployed";

/// Application status label for a failed deployment.
pub const STATUS_ERROR: &str = "error";

impl FinalState {
    /// The application status label this outcome promotes to.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.errored {
            STATUS_ERROR
        } else {
            STATUS_DEPLOYED
        }
    }
}

/// Conditionally transitions an application's durable status.
pub struct StatusPromoter {
    applications: Arc<dyn ApplicationStore>,
}

impl StatusPromoter {
    /// Creates a promoter over the given application store.
    #[must_use]
    pub fn new(applications: Arc<dyn ApplicationStore>) -> Self {
        Self { applications }
    }

    /// Writes the outcome status to the owning application.
    ///
    /// Returns the status label that was written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApplicationNotRegistered`] when the application
    /// record does not exist, or the store's error unmodified for
    /// transport failures.
    pub async fn promote(
        &self,
        application_id: &ApplicationId,
        state: FinalState,
    ) -> Result<&'static str> {
        let status = state.status();
        match self.applications.set_status(application_id, status).await? {
            StatusUpdate::Applied => {
                tracing::info!(
                    application_id = %application_id,
                    status,
                    "promoted deployment outcome to application status"
                );
                Ok(status)
            }
            StatusUpdate::NotFound => Err(Error::ApplicationNotRegistered {
                application_id: application_id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn outcome_labels() {
        assert_eq!(FinalState { errored: true }.status(), STATUS_ERROR);
        assert_eq!(FinalState { errored: false }.status(), STATUS_DEPLOYED);
    }

    #[tokio::test]
    async fn promotes_status_on_existing_application() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let app = ApplicationId::new("app-1");
        store.register_application(&app, "deploying")?;

        let promoter = StatusPromoter::new(store.clone());
        let status = promoter.promote(&app, FinalState { errored: false }).await?;
        assert_eq!(status, STATUS_DEPLOYED);
        assert_eq!(store.application_status(&app)?.as_deref(), Some("deployed"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_application_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let promoter = StatusPromoter::new(store);

        let err = promoter
            .promote(&ApplicationId::new("app-ghost"), FinalState { errored: true })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ApplicationNotRegistered { .. }));
    }
}
