//! # capstan-status
//!
//! Deployment state reconciliation engine for the capstan deployment
//! pipeline.
//!
//! The orchestration platform reports a deployment task's lifecycle
//! (pending, running, stopped) asynchronously, out of order, and possibly
//! more than once. This crate ingests those lifecycle events, maps them to
//! the in-flight deployment record they belong to, and applies them under
//! a conditional-write discipline so that:
//!
//! - **Monotonicity**: a deployment's persisted version never decreases,
//!   and no event at or below the persisted version mutates other fields
//! - **Idempotence**: replaying an event any number of times is safe
//! - **Sparse preservation**: an event only ever writes the fields it
//!   explicitly carries
//!
//! Terminal events additionally promote the deployment's pass/fail outcome
//! into the owning application's durable status, and a best-effort
//! notification is published for real-time observers.
//!
//! ## Core Concepts
//!
//! - **Lifecycle event**: a task state change delivered by the platform's
//!   event bus ([`event::TaskStateChangeEvent`])
//! - **Correlation**: lifecycle events do not self-describe their owner;
//!   the [`resolver::CorrelationResolver`] recovers the
//!   (application, deployment) pair from tags placed on the task at launch
//! - **Reconciliation**: the [`reconciler::Reconciler`] applies a
//!   [`changeset::ChangeSet`] through the store's conditional update and
//!   classifies the result as applied, ignored-stale, or a hard error
//! - **Sweeping**: the [`sweeper::DeletionSweeper`] removes a deleted
//!   application's entire deployment history in bounded batches
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use capstan_status::handler::StateChangeHandler;
//! use capstan_status::resolver::TaskDescriber;
//! use capstan_status::store::memory::MemoryStore;
//!
//! # fn wire(describer: Arc<dyn TaskDescriber>) {
//! let store = Arc::new(MemoryStore::new());
//! let handler = StateChangeHandler::new(describer, store.clone(), store);
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod changeset;
pub mod config;
pub mod deployment;
pub mod error;
pub mod event;
pub mod handler;
pub mod notifier;
pub mod promoter;
pub mod reconciler;
pub mod resolver;
pub mod store;
pub mod sweeper;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::changeset::{ChangeSet, change_set_for};
    pub use crate::config::Config;
    pub use crate::deployment::{Deployment, DeploymentKey};
    pub use crate::error::{Error, Result};
    pub use crate::event::{FinalState, TaskStateChange, TaskStateChangeEvent};
    pub use crate::handler::{Outcome, StateChangeHandler};
    pub use crate::notifier::{ApplicationStatusEvent, StatusNotifier};
    pub use crate::promoter::StatusPromoter;
    pub use crate::reconciler::{Reconciler, Reconciliation};
    pub use crate::resolver::{Correlation, CorrelationResolver, TaskDescriber};
    pub use crate::store::{ApplicationStore, DeploymentStore, UpdateOutcome};
    pub use crate::sweeper::{DeletionSweeper, SweepReport};
}
