//! poolsmith.toml configuration.
//!
//! ```toml
//! [provisioner]
//! demand_key = "provision-for-team"
//! match_policy = "value-only"
//!
//! [provisioner.pool]
//! capacity_types = ["spot"]
//!
//! [controller]
//! workers = 2
//! resync_interval_secs = 10
//!
//! [queue]
//! base_ms = 500
//! max_ms = 300000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use poolsmith_queue::Backoff;
use poolsmith_reconcile::ProvisionerConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub controller: ControllerConfig,
    pub queue: Backoff,
    pub provisioner: ProvisionerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Concurrent reconcile workers.
    pub workers: usize,
    /// How often every pending workload is re-enqueued.
    pub resync_interval_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            resync_interval_secs: 10,
        }
    }
}

impl ControllerConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
