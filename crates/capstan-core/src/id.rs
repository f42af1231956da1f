//! Strongly-typed identifiers for capstan entities.
//!
//! Identifiers are opaque strings: the request layer mints them before a
//! deployment task is launched, and the reconciliation engine only ever
//! routes on them. The newtypes exist so application and deployment ids
//! cannot be mixed up at compile time.
//!
//! # Example
//!
//! ```rust
//! use capstan_core::id::{ApplicationId, DeploymentId};
//!
//! let app = ApplicationId::generate();
//! let deployment = DeploymentId::generate();
//!
//! // IDs are different types - this won't compile:
//! // let wrong: ApplicationId = deployment;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

use crate::error::{Error, Result};

/// A unique identifier for an application.
///
/// One application exists per deployable workload; its id is the primary
/// key of the applications table and the partition key of the
/// deployments table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Creates an application ID from an opaque string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new unique application ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidId {
                message: "empty application id".into(),
            });
        }
        Ok(Self(s.to_string()))
    }
}

/// A unique identifier for one attempt to deploy a workload.
///
/// Together with the owning [`ApplicationId`] it forms the composite key
/// of the deployments table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentId(String);

impl DeploymentId {
    /// Creates a deployment ID from an opaque string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new unique deployment ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeploymentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidId {
                message: "empty deployment id".into(),
            });
        }
        Ok(Self(s.to_string()))
    }
}
