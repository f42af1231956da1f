//! # capstan-core
//!
//! Shared building blocks for the capstan deployment pipeline:
//!
//! - **Strongly-typed identifiers**: [`ApplicationId`] and [`DeploymentId`]
//!   are opaque strings minted by the request layer before a deployment
//!   task is launched
//! - **Attribute items**: [`item::Item`] is the field-level record shape
//!   exchanged with the key-value store, so partial updates can be
//!   expressed as explicit field sets instead of whole-record writes
//!
//! The reconciliation engine itself lives in `capstan-status`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod item;

pub use error::{Error, Result};
pub use id::{ApplicationId, DeploymentId};
