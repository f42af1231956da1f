//! Engine configuration.
//!
//! The store traits absorb what the original deployment kept in
//! environment variables (table names live behind the store
//! implementation); what remains configurable here is the sweep page
//! size and the source tag stamped on outgoing notifications.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::MAX_DELETE_BATCH;

/// Environment variable overriding the sweep page size.
pub const SWEEP_PAGE_SIZE_ENV: &str = "CAPSTAN_SWEEP_PAGE_SIZE";

/// Environment variable overriding the notification source tag.
pub const NOTIFICATION_SOURCE_ENV: &str = "CAPSTAN_NOTIFICATION_SOURCE";

fn default_sweep_page_size() -> usize {
    MAX_DELETE_BATCH
}

fn default_notification_source() -> String {
    "capstan-status".to_string()
}

/// Engine configuration with serde defaults and env overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Page size for deletion sweeps; capped at the store's batch limit.
    #[serde(default = "default_sweep_page_size")]
    pub sweep_page_size: usize,

    /// Source tag stamped on outgoing status notifications.
    #[serde(default = "default_notification_source")]
    pub notification_source: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_page_size: default_sweep_page_size(),
            notification_source: default_notification_source(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a set variable does not parse or
    /// is out of range.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(SWEEP_PAGE_SIZE_ENV) {
            let page_size: usize = raw.parse().map_err(|_| Error::Config {
                message: format!("{SWEEP_PAGE_SIZE_ENV} must be an integer, got '{raw}'"),
            })?;
            if page_size == 0 || page_size > MAX_DELETE_BATCH {
                return Err(Error::Config {
                    message: format!(
                        "{SWEEP_PAGE_SIZE_ENV} must be between 1 and {MAX_DELETE_BATCH}, got {page_size}"
                    ),
                });
            }
            config.sweep_page_size = page_size;
        }

        if let Ok(source) = std::env::var(NOTIFICATION_SOURCE_ENV) {
            if source.is_empty() {
                return Err(Error::Config {
                    message: format!("{NOTIFICATION_SOURCE_ENV} must not be empty"),
                });
            }
            config.notification_source = source;
        }

        Ok(config)
    }
}
