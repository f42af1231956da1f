//! Applying versioned change-sets with monotonic ordering guarantees.
//!
//! The reconciler is a thin classification layer over the store's
//! conditional update. It turns the three possible outcomes into the
//! engine's vocabulary:
//!
//! - **Applied**: this event's version won and its fields are persisted
//! - **Ignored-stale**: an equal or newer version already won; expected
//!   under duplicate/out-of-order delivery, logged and dropped
//! - **Error**: the deployment was never registered, or the store failed
//!
//! Replaying the same event any number of times is safe: repeat
//! applications fail the ordering condition and classify as stale.

use std::sync::Arc;

use crate::changeset::ChangeSet;
use crate::deployment::{Deployment, DeploymentKey};
use crate::error::{Error, Result};
use crate::store::{DeploymentStore, UpdateOutcome};

/// Classification of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The change-set was applied.
    Applied,
    /// An equal or newer version is already persisted; nothing changed.
    IgnoredStale {
        /// The record that won, when its pre-image decoded cleanly.
        existing: Option<Deployment>,
    },
}

impl Reconciliation {
    /// Returns true if the change-set was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Applies change-sets to deployment records.
pub struct Reconciler {
    deployments: Arc<dyn DeploymentStore>,
}

impl Reconciler {
    /// Creates a reconciler over the given deployment store.
    #[must_use]
    pub fn new(deployments: Arc<dyn DeploymentStore>) -> Self {
        Self { deployments }
    }

    /// Applies a change-set to the deployment at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeploymentNotRegistered`] when no record exists
    /// for the key (the request layer owns creating it before launch),
    /// or the store's error unmodified for transport failures. Ordering
    /// conflicts are not errors.
    pub async fn reconcile(
        &self,
        key: &DeploymentKey,
        change: &ChangeSet,
    ) -> Result<Reconciliation> {
        match self.deployments.update_conditional(key, change).await? {
            UpdateOutcome::Applied => {
                tracing::debug!(
                    deployment = %key,
                    version = change.version(),
                    "applied deployment state change"
                );
                Ok(Reconciliation::Applied)
            }
            UpdateOutcome::NotFound => Err(Error::DeploymentNotRegistered {
                application_id: key.application_id.clone(),
                deployment_id: key.deployment_id.clone(),
            }),
            UpdateOutcome::Conflict(conflict) => {
                if let Some(decode_error) = &conflict.decode_error {
                    tracing::warn!(
                        deployment = %key,
                        ignored_version = change.version(),
                        %decode_error,
                        "ignoring stale state change; conflicting record did not decode"
                    );
                } else if let Some(existing) = &conflict.existing {
                    tracing::info!(
                        deployment = %key,
                        ignored_version = change.version(),
                        existing_version = existing.version,
                        existing_status = existing.last_status.as_deref().unwrap_or(""),
                        "ignoring stale state change; newer version already persisted"
                    );
                } else {
                    // A store may reject without returning the pre-image.
                    tracing::info!(
                        deployment = %key,
                        ignored_version = change.version(),
                        "ignoring stale state change; no pre-image returned"
                    );
                }
                Ok(Reconciliation::IgnoredStale {
                    existing: conflict.existing,
                })
            }
        }
    }
}
