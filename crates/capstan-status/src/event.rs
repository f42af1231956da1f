//! Lifecycle events delivered by the orchestration platform's event bus.
//!
//! The platform publishes a task state change event every time a
//! deployment task moves through its lifecycle. Delivery is unreliable in
//! both order and count: a given version may arrive never, once, or many
//! times, and a higher version may arrive before a lower one. The event
//! carries a task-scoped revision counter (`version`) that the
//! reconciler uses as the single ordering authority.
//!
//! The structs here model only the fields this engine consumes; the
//! actual bus event carries more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The lifecycle state after which no further transitions are expected.
pub const TERMINAL_STATUS: &str = "STOPPED";

/// The event-bus envelope around a task state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChangeEvent {
    /// Unique event identifier assigned by the bus.
    pub id: String,

    /// Envelope schema version assigned by the bus (not the task revision).
    #[serde(default)]
    pub version: String,

    /// Event classification, e.g. `ECS Task State Change`.
    #[serde(rename = "detail-type")]
    pub detail_type: String,

    /// Event origin, e.g. `aws.ecs`.
    pub source: String,

    /// Publication timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Region the event originated in.
    #[serde(default)]
    pub region: String,

    /// Account the event originated in.
    #[serde(default)]
    pub account: String,

    /// Resources the event refers to (typically the task ARN).
    #[serde(default)]
    pub resources: Vec<String>,

    /// The task state change itself.
    pub detail: TaskStateChange,
}

impl TaskStateChangeEvent {
    /// Parses an event from its JSON wire form, as delivered by the
    /// event bus to the invoking infrastructure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] when the payload is not a valid
    /// event.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
    }
}

/// The state change detail: the part of the event this engine acts on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChange {
    /// Execution handle of the task that changed state.
    pub task_arn: String,

    /// The cluster the task runs on, needed for the tag lookup.
    pub cluster_arn: String,

    /// The task definition the task was launched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,

    /// Task-scoped revision counter.
    ///
    /// Only meaningful within one task's event stream; strictly greater
    /// versions win during reconciliation.
    pub version: i64,

    /// The lifecycle state the task is in now.
    pub last_status: String,

    /// The lifecycle state the orchestrator is driving the task toward.
    pub desired_status: String,

    /// Per-container states, carrying the exit codes that decide whether
    /// a terminal deployment errored.
    #[serde(default)]
    pub containers: Vec<ContainerStateChange>,

    /// When the task was created (entered `PENDING`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the task transitioned from `PENDING` to `RUNNING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When this state change happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// When the task transitioned from `RUNNING` to `STOPPING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopping_at: Option<DateTime<Utc>>,

    /// When the task transitioned to `STOPPED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,

    /// When task execution stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_stopped_at: Option<DateTime<Utc>>,

    /// Orchestrator stop classification, e.g. `EssentialContainerExited`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_code: Option<String>,

    /// Human-readable stop diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_reason: Option<String>,
}

impl TaskStateChange {
    /// Returns true when this change reports the terminal lifecycle state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.last_status == TERMINAL_STATUS
    }

    /// Derives the deployment outcome for a terminal change.
    ///
    /// Returns `None` for non-terminal changes. The stop code cannot
    /// distinguish a successful run from a failed one (both stop with
    /// `EssentialContainerExited`), so the outcome comes from the
    /// container exit codes instead: errored iff any container exited
    /// non-zero.
    #[must_use]
    pub fn final_state(&self) -> Option<FinalState> {
        if !self.is_terminal() {
            return None;
        }
        Some(FinalState {
            errored: self.containers.iter().any(|c| c.exit_code != 0),
        })
    }
}

/// Per-container state within a task state change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStateChange {
    /// The container's exit code; absent means 0.
    #[serde(default)]
    pub exit_code: i64,

    /// The image the container ran.
    #[serde(default)]
    pub image: String,

    /// The container's own lifecycle state.
    #[serde(default)]
    pub last_status: String,

    /// The owning task.
    #[serde(default)]
    pub task_arn: String,
}

/// The pass/fail outcome of a terminal lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalState {
    /// True when at least one container exited non-zero.
    pub errored: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "11aa22bb-3c4d-5e6f-7a8b-9c0d1e2f3a4b",
        "version": "0",
        "detail-type": "ECS Task State Change",
        "source": "aws.ecs",
        "time": "2025-06-01T12:00:00Z",
        "region": "us-east-1",
        "account": "123456789012",
        "resources": ["arn:aws:ecs:us-east-1:123456789012:task/deploy/abc"],
        "detail": {
            "taskArn": "arn:aws:ecs:us-east-1:123456789012:task/deploy/abc",
            "clusterArn": "arn:aws:ecs:us-east-1:123456789012:cluster/deploy",
            "taskDefinitionArn": "arn:aws:ecs:us-east-1:123456789012:task-definition/deploy:7",
            "version": 4,
            "lastStatus": "STOPPED",
            "desiredStatus": "STOPPED",
            "stopCode": "EssentialContainerExited",
            "stoppedReason": "Essential container in task exited",
            "createdAt": "2025-06-01T11:55:00Z",
            "startedAt": "2025-06-01T11:56:00Z",
            "stoppedAt": "2025-06-01T11:59:30Z",
            "containers": [
                {"exitCode": 1, "image": "builder:latest", "lastStatus": "STOPPED"}
            ]
        }
    }"#;

    #[test]
    fn from_json_parses_the_wire_form() {
        let event = TaskStateChangeEvent::from_json(SAMPLE).unwrap();
        assert_eq!(event.detail.version, 4);
    }

    #[test]
    fn from_json_rejects_malformed_payloads() {
        let err = TaskStateChangeEvent::from_json("{\"id\": 7}").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn deserializes_bus_event() {
        let event: TaskStateChangeEvent = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(event.detail_type, "ECS Task State Change");
        assert_eq!(event.detail.version, 4);
        assert_eq!(event.detail.last_status, "STOPPED");
        assert_eq!(event.detail.stop_code.as_deref(), Some("EssentialContainerExited"));
        assert!(event.detail.created_at.is_some());
        assert!(event.detail.updated_at.is_none());
        assert_eq!(event.detail.containers.len(), 1);
        assert_eq!(event.detail.containers[0].exit_code, 1);
    }

    #[test]
    fn final_state_errored_on_nonzero_exit() {
        let event: TaskStateChangeEvent = serde_json::from_str(SAMPLE).unwrap();
        let state = event.detail.final_state().unwrap();
        assert!(state.errored);
    }

    #[test]
    fn final_state_clean_when_all_containers_exit_zero() {
        let detail = TaskStateChange {
            last_status: TERMINAL_STATUS.to_string(),
            containers: vec![
                ContainerStateChange::default(),
                ContainerStateChange::default(),
            ],
            ..TaskStateChange::default()
        };
        assert_eq!(detail.final_state(), Some(FinalState { errored: false }));
    }

    #[test]
    fn final_state_none_before_terminal() {
        let detail = TaskStateChange {
            last_status: "RUNNING".to_string(),
            containers: vec![ContainerStateChange {
                exit_code: 1,
                ..ContainerStateChange::default()
            }],
            ..TaskStateChange::default()
        };
        assert!(detail.final_state().is_none());
    }

    #[test]
    fn missing_exit_code_defaults_to_zero() {
        let json = r#"{"image": "builder:latest"}"#;
        let container: ContainerStateChange = serde_json::from_str(json).unwrap();
        assert_eq!(container.exit_code, 0);
    }
}
