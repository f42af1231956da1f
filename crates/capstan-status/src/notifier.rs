//! Best-effort status notifications for real-time observers.
//!
//! After a terminal promotion the engine publishes a status event on the
//! application's channel. The channel is fire-and-forget: publish
//! failures are logged by the caller and never block or fail the
//! reconciliation that produced them.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use capstan_core::{ApplicationId, DeploymentId};

use crate::error::{Error, Result};

/// Event name status events are published under.
pub const STATUS_EVENT_NAME: &str = "application_status_event";

/// Returns the notification channel for an application.
#[must_use]
pub fn application_channel(application_id: &ApplicationId) -> String {
    format!("application-{application_id}")
}

/// A status event as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatusEvent {
    /// The owning application.
    pub application_id: ApplicationId,
    /// The deployment whose outcome is being reported.
    pub deployment_id: DeploymentId,
    /// The status label that was promoted.
    pub status: String,
    /// When the event was published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// True when the status reports a failure.
    pub is_error: bool,
    /// Which component published the event.
    pub source: String,
}

/// Narrow capability over the notification transport.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Publishes a status event on a channel under an event name.
    ///
    /// Observers subscribe to the channel and key on the event name, so
    /// both are part of the wire contract; the engine always passes
    /// [`STATUS_EVENT_NAME`].
    ///
    /// # Errors
    ///
    /// Returns an error when the transport rejects the publish; callers
    /// treat this as best-effort and only log it.
    async fn publish(
        &self,
        channel: &str,
        event_name: &str,
        event: &ApplicationStatusEvent,
    ) -> Result<()>;
}

/// A publish as recorded by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPublish {
    /// The channel published on.
    pub channel: String,
    /// The event name published under.
    pub event_name: String,
    /// The event payload.
    pub event: ApplicationStatusEvent,
}

/// In-memory notifier that records published events, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<RecordedPublish>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail.
    pub fn fail_publishes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Returns all recorded publishes in publish order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn published(&self) -> Result<Vec<RecordedPublish>> {
        self.published
            .lock()
            .map(|events| events.clone())
            .map_err(|_| Error::storage("lock poisoned"))
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn publish(
        &self,
        channel: &str,
        event_name: &str,
        event: &ApplicationStatusEvent,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::storage("notification transport unavailable"));
        }
        self.published
            .lock()
            .map_err(|_| Error::storage("lock poisoned"))?
            .push(RecordedPublish {
                channel: channel.to_string(),
                event_name: event_name.to_string(),
                event: event.clone(),
            });
        Ok(())
    }
}
