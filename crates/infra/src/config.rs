//! Store configuration from the process environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `REPORTS_DATABASE_URL` | unset (no Postgres gateway) |
//! | `REPORTS_INVENTORY_COLLECTION` | `inventory` |
//! | `REPORTS_METRIC_COLLECTION` | `metric` |
//! | `REPORTS_DEVICE_COLLECTION` | `device` |
//! | `REPORTS_REPORT_COLLECTION` | `report` |
//! | `REPORTS_STORE_TIMEOUT_MS` | `3000` (`0` disables the deadline) |
//! | `REPORTS_FOREIGN_KEY_JOIN` | `all` (or `last`) |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::reports::ForeignKeyJoin;
use crate::store::CallOptions;

pub const DATABASE_URL_VAR: &str = "REPORTS_DATABASE_URL";
pub const INVENTORY_COLLECTION_VAR: &str = "REPORTS_INVENTORY_COLLECTION";
pub const METRIC_COLLECTION_VAR: &str = "REPORTS_METRIC_COLLECTION";
pub const DEVICE_COLLECTION_VAR: &str = "REPORTS_DEVICE_COLLECTION";
pub const REPORT_COLLECTION_VAR: &str = "REPORTS_REPORT_COLLECTION";
pub const STORE_TIMEOUT_VAR: &str = "REPORTS_STORE_TIMEOUT_MS";
pub const FOREIGN_KEY_JOIN_VAR: &str = "REPORTS_FOREIGN_KEY_JOIN";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Collection names per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub inventory: String,
    pub metric: String,
    pub device: String,
    pub report: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            inventory: "inventory".to_string(),
            metric: "metric".to_string(),
            device: "device".to_string(),
            report: "report".to_string(),
        }
    }
}

impl Collections {
    pub fn all(&self) -> [&str; 4] {
        [
            self.inventory.as_str(),
            self.metric.as_str(),
            self.device.as_str(),
            self.report.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub collections: Collections,
    /// Per-call deadline; zero means none.
    pub timeout: Duration,
    pub join: ForeignKeyJoin,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            collections: Collections::default(),
            timeout: DEFAULT_TIMEOUT,
            join: ForeignKeyJoin::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset;
    /// unparseable values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Collections::default();

        let timeout = match get(STORE_TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    warn!(variable = STORE_TIMEOUT_VAR, value = %raw, error = %e, "invalid store timeout, using default");
                    DEFAULT_TIMEOUT
                }
            },
        };

        let join = match get(FOREIGN_KEY_JOIN_VAR) {
            None => ForeignKeyJoin::default(),
            Some(raw) => ForeignKeyJoin::parse(&raw).unwrap_or_else(|| {
                warn!(variable = FOREIGN_KEY_JOIN_VAR, value = %raw, "unknown join mode, using default");
                ForeignKeyJoin::default()
            }),
        };

        Self {
            database_url: get(DATABASE_URL_VAR),
            collections: Collections {
                inventory: get(INVENTORY_COLLECTION_VAR).unwrap_or(defaults.inventory),
                metric: get(METRIC_COLLECTION_VAR).unwrap_or(defaults.metric),
                device: get(DEVICE_COLLECTION_VAR).unwrap_or(defaults.device),
                report: get(REPORT_COLLECTION_VAR).unwrap_or(defaults.report),
            },
            timeout,
            join,
        }
    }

    /// Options for one store call starting now.
    pub fn call_options(&self) -> CallOptions {
        if self.timeout.is_zero() {
            CallOptions::none()
        } else {
            CallOptions::with_timeout(self.timeout)
        }
    }
}
