//! Pluggable storage for deployment and application records.
//!
//! The two capability traits here are the engine's only point of
//! synchronization: every coordination problem the unreliable event
//! stream creates (duplicates, reordering, concurrent handlers) is
//! resolved by the store's single-item conditional write, never by
//! in-process locking.
//!
//! ## Design Principles
//!
//! - **Conditional-write semantics**: updates are applied only when a
//!   server-evaluated predicate on the current record holds
//! - **Narrow capabilities**: each trait exposes only the operations the
//!   engine uses, so test doubles substitute without a network dependency
//! - **Pre-image diagnostics**: a rejected update returns the existing
//!   record so callers can tell "a newer version already won" from a
//!   genuine problem

pub mod memory;

use async_trait::async_trait;

use capstan_core::ApplicationId;
use capstan_core::item::DecodeError;

use crate::changeset::ChangeSet;
use crate::deployment::{Deployment, DeploymentKey};
use crate::error::Result;

/// Most keys a single batch delete may carry; pages are sized to match.
pub const MAX_DELETE_BATCH: usize = 25;

/// Result of a conditional deployment update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was applied.
    Applied,
    /// The record does not exist; the existence condition failed.
    NotFound,
    /// The ordering condition failed: an equal or newer version is
    /// already persisted. Nothing was mutated.
    Conflict(VersionConflict),
}

impl UpdateOutcome {
    /// Returns true if the update was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Returns true if the record was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Diagnostics for a rejected update: the pre-existing record, or the
/// reason it could not be decoded.
///
/// A decode failure here does not escalate: the write itself was already
/// correctly rejected, the pre-image is only lost for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    /// The record that won, when its pre-image decoded cleanly.
    pub existing: Option<Deployment>,
    /// Why the pre-image could not be decoded, when it could not.
    pub decode_error: Option<DecodeError>,
}

/// Result of a conditional application status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The status was written.
    Applied,
    /// The application record does not exist; nothing was written.
    NotFound,
}

/// One page of deployment keys from a key-only query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPage {
    /// The keys on this page, at most the requested limit.
    pub keys: Vec<DeploymentKey>,
    /// Continuation token: pass back to fetch the next page.
    pub next: Option<DeploymentKey>,
}

/// Storage abstraction for deployment records.
///
/// ## Conditional-Write Semantics
///
/// `update_conditional` is the core primitive for correctness under
/// unordered, duplicated delivery: exactly one writer can satisfy the
/// ordering condition for a given version, so concurrent handlers racing
/// on the same key are safe without any other coordination.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Conditionally applies a change-set to the record at `key`.
    ///
    /// Implementations must enforce two conditions atomically:
    ///
    /// - **Existence**: both key attributes already exist on the stored
    ///   item (no upsert; unregistered deployments are rejected)
    /// - **Ordering**: the stored version attribute is absent or
    ///   strictly less than `change.version()`
    ///
    /// On an ordering rejection the pre-existing item is returned inside
    /// [`UpdateOutcome::Conflict`] for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error only for store/transport failures; condition
    /// failures are values, not errors.
    async fn update_conditional(
        &self,
        key: &DeploymentKey,
        change: &ChangeSet,
    ) -> Result<UpdateOutcome>;

    /// Queries one page of deployment keys owned by an application.
    ///
    /// Key-only projection; `start_after` is the continuation token
    /// returned by the previous page.
    ///
    /// # Errors
    ///
    /// Returns an error for store/transport failures.
    async fn query_key_page(
        &self,
        application_id: &ApplicationId,
        limit: usize,
        start_after: Option<DeploymentKey>,
    ) -> Result<KeyPage>;

    /// Deletes a batch of deployment records.
    ///
    /// Returns the subset the store could not process (e.g. due to
    /// throttling); callers resubmit those until none remain. Deleting an
    /// absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch exceeds [`MAX_DELETE_BATCH`] or for
    /// store/transport failures.
    async fn delete_batch(&self, keys: Vec<DeploymentKey>) -> Result<Vec<DeploymentKey>>;
}

/// Storage abstraction for application records.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Conditionally sets the application's durable status.
    ///
    /// The only condition is existence: the status of an application
    /// that was never registered is not upserted. Only the status field
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns an error for store/transport failures.
    async fn set_status(
        &self,
        application_id: &ApplicationId,
        status: &str,
    ) -> Result<StatusUpdate>;
}
