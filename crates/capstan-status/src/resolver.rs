//! Correlation: mapping a task to the deployment it belongs to.
//!
//! Lifecycle events do not self-describe which logical deployment they
//! belong to. The deploy layer tags every task it launches with the
//! deployment and application ids; this module looks those tags back up
//! through the orchestrator's task description. Ideally the event itself
//! would carry the tags, but it does not.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use capstan_core::{ApplicationId, DeploymentId};

use crate::error::{Error, Result};

/// Tag key carrying the deployment id on a launched task.
pub const DEPLOYMENT_ID_TAG: &str = "DeploymentId";

/// Tag key carrying the application id on a launched task.
pub const APPLICATION_ID_TAG: &str = "ApplicationId";

/// A task description as returned by the orchestrator's lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDescription {
    /// The described task's execution handle.
    pub task_arn: String,
    /// Descriptive tags attached to the task at launch time.
    pub tags: BTreeMap<String, String>,
}

/// Narrow capability over the orchestrator: describe one task.
#[async_trait]
pub trait TaskDescriber: Send + Sync {
    /// Looks up the description of a task on a cluster.
    ///
    /// Returns `Ok(None)` when the orchestrator has no description for
    /// the task (point-in-time lookup; descriptions age out).
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures; those are propagated
    /// unmodified for external retry.
    async fn describe_task(
        &self,
        task_arn: &str,
        cluster_arn: &str,
    ) -> Result<Option<TaskDescription>>;
}

/// The (application, deployment) pair an event is routed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// The owning application.
    pub application_id: ApplicationId,
    /// The deployment attempt.
    pub deployment_id: DeploymentId,
}

/// Resolves correlation identifiers from task tags.
pub struct CorrelationResolver {
    describer: Arc<dyn TaskDescriber>,
}

impl CorrelationResolver {
    /// Creates a resolver over the given orchestrator capability.
    #[must_use]
    pub fn new(describer: Arc<dyn TaskDescriber>) -> Self {
        Self { describer }
    }

    /// Resolves the correlation identifiers for a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCorrelation`] when the task description
    /// cannot be found or either well-known tag is absent or empty; the
    /// event cannot be safely attributed and must be surfaced for
    /// retry/alerting rather than silently dropped. Transport failures
    /// propagate unmodified.
    pub async fn resolve(&self, task_arn: &str, cluster_arn: &str) -> Result<Correlation> {
        let description = self
            .describer
            .describe_task(task_arn, cluster_arn)
            .await?
            .ok_or_else(|| Error::MissingCorrelation {
                task_arn: task_arn.to_string(),
                message: "no task description found".into(),
            })?;

        let application_id = Self::tag(&description, task_arn, APPLICATION_ID_TAG)?;
        let deployment_id = Self::tag(&description, task_arn, DEPLOYMENT_ID_TAG)?;

        Ok(Correlation {
            application_id: ApplicationId::from_str(application_id).map_err(|e| {
                Error::MissingCorrelation {
                    task_arn: task_arn.to_string(),
                    message: e.to_string(),
                }
            })?,
            deployment_id: DeploymentId::from_str(deployment_id).map_err(|e| {
                Error::MissingCorrelation {
                    task_arn: task_arn.to_string(),
                    message: e.to_string(),
                }
            })?,
        })
    }

    fn tag<'a>(
        description: &'a TaskDescription,
        task_arn: &str,
        tag_key: &str,
    ) -> Result<&'a str> {
        description
            .tags
            .get(tag_key)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingCorrelation {
                task_arn: task_arn.to_string(),
                message: format!("missing '{tag_key}' tag"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDescriber {
        description: Option<TaskDescription>,
    }

    #[async_trait]
    impl TaskDescriber for FakeDescriber {
        async fn describe_task(
            &self,
            _task_arn: &str,
            _cluster_arn: &str,
        ) -> Result<Option<TaskDescription>> {
            Ok(self.description.clone())
        }
    }

    fn tagged(tags: &[(&str, &str)]) -> Arc<FakeDescriber> {
        Arc::new(FakeDescriber {
            description: Some(TaskDescription {
                task_arn: "arn:task/abc".into(),
                tags: tags
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            }),
        })
    }

    #[tokio::test]
    async fn resolves_both_ids_from_tags() -> Result<()> {
        let resolver = CorrelationResolver::new(tagged(&[
            (APPLICATION_ID_TAG, "app-1"),
            (DEPLOYMENT_ID_TAG, "dep-1"),
            ("Team", "platform"),
        ]));

        let correlation = resolver.resolve("arn:task/abc", "arn:cluster/deploy").await?;
        assert_eq!(correlation.application_id.as_str(), "app-1");
        assert_eq!(correlation.deployment_id.as_str(), "dep-1");
        Ok(())
    }

    #[tokio::test]
    async fn missing_description_is_a_correlation_failure() {
        let resolver = CorrelationResolver::new(Arc::new(FakeDescriber { description: None }));
        let err = resolver
            .resolve("arn:task/abc", "arn:cluster/deploy")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCorrelation { .. }));
    }

    #[tokio::test]
    async fn missing_deployment_tag_is_a_correlation_failure() {
        let resolver =
            CorrelationResolver::new(tagged(&[(APPLICATION_ID_TAG, "app-1")]));
        let err = resolver
            .resolve("arn:task/abc", "arn:cluster/deploy")
            .await
            .unwrap_err();
        let Error::MissingCorrelation { message, .. } = err else {
            panic!("expected missing correlation, got {err:?}");
        };
        assert!(message.contains(DEPLOYMENT_ID_TAG));
    }

    #[tokio::test]
    async fn empty_tag_value_is_a_correlation_failure() {
        let resolver = CorrelationResolver::new(tagged(&[
            (APPLICATION_ID_TAG, ""),
            (DEPLOYMENT_ID_TAG, "dep-1"),
        ]));
        let err = resolver
            .resolve("arn:task/abc", "arn:cluster/deploy")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCorrelation { .. }));
    }
}
