//! In-memory store implementation for testing.
//!
//! [`MemoryStore`] implements both store traits with the same
//! conditional semantics a production store provides, plus seams for
//! seeding records and simulating partially processed batch deletes.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: no durability, no cross-process
//!   coordination
//! - **Single-process only**: state is not shared across process
//!   boundaries

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use capstan_core::ApplicationId;
use capstan_core::item::{Item, Value};

use super::{
    ApplicationStore, DeploymentStore, KeyPage, MAX_DELETE_BATCH, StatusUpdate, UpdateOutcome,
    VersionConflict,
};
use crate::changeset::ChangeSet;
use crate::deployment::{Deployment, DeploymentKey, application_fields, fields};
use crate::error::{Error, Result};

/// In-memory store for testing.
///
/// Thread-safe via `RwLock`; deployments live in a `BTreeMap` so
/// pagination has a stable key order to continue from.
#[derive(Debug, Default)]
pub struct MemoryStore {
    deployments: RwLock<BTreeMap<DeploymentKey, Item>>,
    applications: RwLock<HashMap<ApplicationId, Item>>,
    unprocessed_once: Mutex<usize>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deployment record carrying only its key attributes,
    /// the way the request layer creates one before launching the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn register_deployment(&self, key: &DeploymentKey) -> Result<()> {
        let mut deployments = self.deployments.write().map_err(poison_err)?;
        deployments.insert(key.clone(), key.key_item());
        Ok(())
    }

    /// Inserts a raw item at the given key, bypassing all conditions.
    ///
    /// Test seam for shaping pre-existing state, including malformed
    /// records.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn put_deployment_item(&self, key: &DeploymentKey, item: Item) -> Result<()> {
        let mut deployments = self.deployments.write().map_err(poison_err)?;
        deployments.insert(key.clone(), item);
        Ok(())
    }

    /// Registers an application record with an initial status.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn register_application(&self, id: &ApplicationId, status: &str) -> Result<()> {
        let mut item = Item::new();
        item.insert(application_fields::KEY.to_string(), Value::from(id.as_str()));
        item.insert(application_fields::STATUS.to_string(), Value::from(status));
        let mut applications = self.applications.write().map_err(poison_err)?;
        applications.insert(id.clone(), item);
        Ok(())
    }

    /// Reads back a deployment record, decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or the stored item does
    /// not decode.
    pub fn deployment(&self, key: &DeploymentKey) -> Result<Option<Deployment>> {
        let deployments = self.deployments.read().map_err(poison_err)?;
        deployments
            .get(key)
            .map(|item| {
                Deployment::from_item(item)
                    .map_err(|e| Error::storage_with_source("stored deployment is malformed", e))
            })
            .transpose()
    }

    /// Reads back an application's status label.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn application_status(&self, id: &ApplicationId) -> Result<Option<String>> {
        let applications = self.applications.read().map_err(poison_err)?;
        Ok(applications.get(id).and_then(|item| {
            item.get(application_fields::STATUS)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        }))
    }

    /// Returns the number of deployment records owned by an application.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn deployment_count(&self, application_id: &ApplicationId) -> Result<usize> {
        let deployments = self.deployments.read().map_err(poison_err)?;
        Ok(deployments
            .keys()
            .filter(|k| &k.application_id == application_id)
            .count())
    }

    /// Makes the next `delete_batch` call report its first `count` keys
    /// as unprocessed (without deleting them). One-shot.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn leave_unprocessed_once(&self, count: usize) -> Result<()> {
        let mut pending = self.unprocessed_once.lock().map_err(poison_err)?;
        *pending = count;
        Ok(())
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn update_conditional(
        &self,
        key: &DeploymentKey,
        change: &ChangeSet,
    ) -> Result<UpdateOutcome> {
        let mut deployments = self.deployments.write().map_err(poison_err)?;

        let Some(item) = deployments.get_mut(key) else {
            return Ok(UpdateOutcome::NotFound);
        };

        // Existence condition: both key attributes on the stored item.
        if !item.contains_key(fields::APPLICATION_ID) || !item.contains_key(fields::DEPLOYMENT_ID)
        {
            return Ok(UpdateOutcome::NotFound);
        }

        // Ordering condition: version attribute absent, or strictly less
        // than the incoming version. A mistyped stored version cannot
        // compare less-than and therefore fails the condition too.
        let ordered = match item.get(fields::VERSION) {
            None => true,
            Some(value) => value.as_int().is_some_and(|stored| stored < change.version()),
        };
        if !ordered {
            let conflict = match Deployment::from_item(item) {
                Ok(existing) => VersionConflict {
                    existing: Some(existing),
                    decode_error: None,
                },
                Err(e) => VersionConflict {
                    existing: None,
                    decode_error: Some(e),
                },
            };
            return Ok(UpdateOutcome::Conflict(conflict));
        }

        change.apply_to(item);
        Ok(UpdateOutcome::Applied)
    }

    async fn query_key_page(
        &self,
        application_id: &ApplicationId,
        limit: usize,
        start_after: Option<DeploymentKey>,
    ) -> Result<KeyPage> {
        let deployments = self.deployments.read().map_err(poison_err)?;

        let mut remaining = deployments
            .keys()
            .filter(|k| &k.application_id == application_id)
            .filter(|k| start_after.as_ref().is_none_or(|s| *k > s))
            .cloned();

        let keys: Vec<DeploymentKey> = remaining.by_ref().take(limit).collect();
        let next = if remaining.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };
        Ok(KeyPage { keys, next })
    }

    async fn delete_batch(&self, keys: Vec<DeploymentKey>) -> Result<Vec<DeploymentKey>> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::storage(format!(
                "batch of {} keys exceeds the delete limit of {MAX_DELETE_BATCH}",
                keys.len()
            )));
        }

        let unprocessed_count = {
            let mut pending = self.unprocessed_once.lock().map_err(poison_err)?;
            std::mem::take(&mut *pending).min(keys.len())
        };

        let mut deployments = self.deployments.write().map_err(poison_err)?;
        let (unprocessed, processed) = keys.split_at(unprocessed_count);
        for key in processed {
            deployments.remove(key);
        }
        Ok(unprocessed.to_vec())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn set_status(
        &self,
        application_id: &ApplicationId,
        status: &str,
    ) -> Result<StatusUpdate> {
        let mut applications = self.applications.write().map_err(poison_err)?;

        let Some(item) = applications.get_mut(application_id) else {
            return Ok(StatusUpdate::NotFound);
        };
        item.insert(application_fields::STATUS.to_string(), Value::from(status));
        Ok(StatusUpdate::Applied)
    }
}
