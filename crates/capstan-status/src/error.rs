//! Error types for the reconciliation engine.
//!
//! The taxonomy mirrors how failures are handled: correlation and
//! missing-precondition failures are fatal for the event being processed
//! and surfaced to the invoking infrastructure for its own retry policy;
//! ordering conflicts are expected and never reach this type (see
//! [`crate::reconciler::Reconciliation`]).

use capstan_core::{ApplicationId, DeploymentId};

/// The result type used throughout capstan-status.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling deployment state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lifecycle event could not be attributed to a deployment.
    ///
    /// The task description was missing, or one of the well-known
    /// correlation tags was absent. No safe partial progress exists for
    /// such an event.
    #[error("unable to correlate task {task_arn}: {message}")]
    MissingCorrelation {
        /// The task the event referred to.
        task_arn: String,
        /// What exactly could not be resolved.
        message: String,
    },

    /// The deployment record targeted by an event was never created.
    ///
    /// Deployment records are created by the request layer before the
    /// task is launched; their absence is a precondition violation.
    #[error("deployment {deployment_id} of application {application_id} was never registered")]
    DeploymentNotRegistered {
        /// The owning application.
        application_id: ApplicationId,
        /// The deployment the event targeted.
        deployment_id: DeploymentId,
    },

    /// The application targeted by a terminal promotion does not exist.
    #[error("application {application_id} was never registered")]
    ApplicationNotRegistered {
        /// The application the promotion targeted.
        application_id: ApplicationId,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The engine configuration was invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid setting.
        message: String,
    },

    /// An error from capstan-core.
    #[error("core error: {0}")]
    Core(#[from] capstan_core::Error),
}

impl Error {
    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn missing_correlation_display() {
        let err = Error::MissingCorrelation {
            task_arn: "arn:task/abc".into(),
            message: "missing deployment id tag".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("arn:task/abc"));
        assert!(msg.contains("missing deployment id tag"));
    }

    #[test]
    fn deployment_not_registered_display() {
        let err = Error::DeploymentNotRegistered {
            application_id: ApplicationId::new("app-1"),
            deployment_id: DeploymentId::new("dep-1"),
        };
        let msg = err.to_string();
        assert!(msg.contains("app-1"));
        assert!(msg.contains("dep-1"));
        assert!(msg.contains("never registered"));
    }

    #[test]
    fn storage_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "request timed out");
        let err = Error::storage_with_source("conditional update failed", source);
        assert!(err.to_string().contains("storage error"));
        assert!(StdError::source(&err).is_some());
    }
}
