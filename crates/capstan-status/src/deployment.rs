//! Deployment and application records as stored.
//!
//! A deployment record exists per attempt to run a workload's task, keyed
//! by (application, deployment). The record is created by the request
//! layer before the task launches and mutated exclusively through the
//! reconciler's conditional updates, so every field other than the key is
//! optional: a freshly registered record carries nothing but its key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use capstan_core::item::{
    self, DecodeError, Item, Value, optional_bool, optional_int, optional_str, optional_time,
};
use capstan_core::{ApplicationId, DeploymentId};

/// Field names of the deployments table.
pub mod fields {
    /// Partition key: the owning application.
    pub const APPLICATION_ID: &str = "applicationId";
    /// Sort key: the deployment attempt.
    pub const DEPLOYMENT_ID: &str = "deploymentId";
    /// Task-scoped revision counter; the ordering authority.
    pub const VERSION: &str = "version";
    /// Execution handle of the task.
    pub const TASK_ARN: &str = "taskArn";
    /// Last observed lifecycle state.
    pub const LAST_STATUS: &str = "lastStatus";
    /// Lifecycle state the orchestrator is driving toward.
    pub const DESIRED_STATUS: &str = "desiredStatus";
    /// When the task was created.
    pub const CREATED_AT: &str = "createdAt";
    /// When the task started running.
    pub const STARTED_AT: &str = "startedAt";
    /// When the recorded state change happened.
    pub const UPDATED_AT: &str = "updatedAt";
    /// When the task stopped.
    pub const STOPPED_AT: &str = "stoppedAt";
    /// Orchestrator stop classification.
    pub const STOP_CODE: &str = "stopCode";
    /// Human-readable stop diagnostic.
    pub const STOPPED_REASON: &str = "stoppedReason";
    /// Whether the deployment ended in failure; set only at terminal state.
    pub const ERRORED: &str = "errored";
}

/// Field names of the applications table.
pub mod application_fields {
    /// Primary key of the applications table.
    pub const KEY: &str = "uuid";
    /// The application's durable status label.
    pub const STATUS: &str = "registrationStatus";
}

/// Composite key of a deployment record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentKey {
    /// The owning application.
    pub application_id: ApplicationId,
    /// The deployment attempt.
    pub deployment_id: DeploymentId,
}

impl DeploymentKey {
    /// Creates a deployment key.
    #[must_use]
    pub fn new(application_id: ApplicationId, deployment_id: DeploymentId) -> Self {
        Self {
            application_id,
            deployment_id,
        }
    }

    /// Renders the key as a key-only item.
    #[must_use]
    pub fn key_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            fields::APPLICATION_ID.to_string(),
            Value::from(self.application_id.as_str()),
        );
        item.insert(
            fields::DEPLOYMENT_ID.to_string(),
            Value::from(self.deployment_id.as_str()),
        );
        item
    }
}

impl std::fmt::Display for DeploymentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.application_id, self.deployment_id)
    }
}

/// A deployment record decoded from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// The owning application.
    pub application_id: ApplicationId,
    /// The deployment attempt.
    pub deployment_id: DeploymentId,
    /// Last applied revision; `None` until the first event lands.
    pub version: Option<i64>,
    /// Last observed lifecycle state.
    pub last_status: Option<String>,
    /// Lifecycle state the orchestrator is driving toward.
    pub desired_status: Option<String>,
    /// Execution handle of the task.
    pub task_arn: Option<String>,
    /// When the task was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the task started running.
    pub started_at: Option<DateTime<Utc>>,
    /// When the recorded state change happened.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the task stopped.
    pub stopped_at: Option<DateTime<Utc>>,
    /// Orchestrator stop classification.
    pub stop_code: Option<String>,
    /// Human-readable stop diagnostic.
    pub stopped_reason: Option<String>,
    /// Whether the deployment ended in failure.
    pub errored: bool,
}

impl Deployment {
    /// Decodes a stored item into a deployment record.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when a key attribute is absent or any
    /// present attribute carries the wrong type.
    pub fn from_item(stored: &Item) -> Result<Self, DecodeError> {
        Ok(Self {
            application_id: ApplicationId::new(item::require_str(
                stored,
                fields::APPLICATION_ID,
            )?),
            deployment_id: DeploymentId::new(item::require_str(stored, fields::DEPLOYMENT_ID)?),
            version: optional_int(stored, fields::VERSION)?,
            last_status: optional_str(stored, fields::LAST_STATUS)?.map(str::to_string),
            desired_status: optional_str(stored, fields::DESIRED_STATUS)?.map(str::to_string),
            task_arn: optional_str(stored, fields::TASK_ARN)?.map(str::to_string),
            created_at: optional_time(stored, fields::CREATED_AT)?,
            started_at: optional_time(stored, fields::STARTED_AT)?,
            updated_at: optional_time(stored, fields::UPDATED_AT)?,
            stopped_at: optional_time(stored, fields::STOPPED_AT)?,
            stop_code: optional_str(stored, fields::STOP_CODE)?.map(str::to_string),
            stopped_reason: optional_str(stored, fields::STOPPED_REASON)?.map(str::to_string),
            errored: optional_bool(stored, fields::ERRORED)?.unwrap_or(false),
        })
    }

    /// Returns the record's composite key.
    #[must_use]
    pub fn key(&self) -> DeploymentKey {
        DeploymentKey::new(self.application_id.clone(), self.deployment_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> DeploymentKey {
        DeploymentKey::new(ApplicationId::new("app-1"), DeploymentId::new("dep-1"))
    }

    #[test]
    fn key_item_carries_both_key_attributes() {
        let item = key().key_item();
        assert_eq!(item.len(), 2);
        assert_eq!(
            item.get(fields::APPLICATION_ID),
            Some(&Value::from("app-1"))
        );
        assert_eq!(item.get(fields::DEPLOYMENT_ID), Some(&Value::from("dep-1")));
    }

    #[test]
    fn decodes_key_only_item() {
        let deployment = Deployment::from_item(&key().key_item()).unwrap();
        assert_eq!(deployment.application_id.as_str(), "app-1");
        assert_eq!(deployment.deployment_id.as_str(), "dep-1");
        assert_eq!(deployment.version, None);
        assert_eq!(deployment.last_status, None);
        assert!(!deployment.errored);
    }

    #[test]
    fn decodes_full_item() {
        let mut item = key().key_item();
        item.insert(fields::VERSION.into(), Value::from(7_i64));
        item.insert(fields::LAST_STATUS.into(), Value::from("STOPPED"));
        item.insert(fields::DESIRED_STATUS.into(), Value::from("STOPPED"));
        item.insert(fields::TASK_ARN.into(), Value::from("arn:task/abc"));
        item.insert(
            fields::STOPPED_AT.into(),
            Value::from(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        );
        item.insert(fields::ERRORED.into(), Value::from(true));

        let deployment = Deployment::from_item(&item).unwrap();
        assert_eq!(deployment.version, Some(7));
        assert_eq!(deployment.last_status.as_deref(), Some("STOPPED"));
        assert_eq!(deployment.task_arn.as_deref(), Some("arn:task/abc"));
        assert!(deployment.stopped_at.is_some());
        assert!(deployment.errored);
        assert_eq!(deployment.key(), key());
    }

    #[test]
    fn rejects_item_without_key() {
        let mut item = Item::new();
        item.insert(fields::VERSION.into(), Value::from(1_i64));
        assert!(Deployment::from_item(&item).is_err());
    }

    #[test]
    fn rejects_mistyped_version() {
        let mut item = key().key_item();
        item.insert(fields::VERSION.into(), Value::from("three"));
        let err = Deployment::from_item(&item).unwrap_err();
        assert!(err.to_string().contains("version"));
    }
}
