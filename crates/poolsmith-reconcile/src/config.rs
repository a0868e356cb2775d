//! Provisioner configuration.
//!
//! Everything the engine would otherwise hard-code: the demand label, how
//! pools are named and matched, how soon to re-check, and the shape of the
//! pools it creates. Every field has a default, so an empty TOML table is
//! a valid configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use poolsmith_state::{ConsolidationPolicy, NodeClassRef};

/// Label key workloads use to declare which pool they need.
pub const DEFAULT_DEMAND_KEY: &str = "provision-for-team";

/// Prefix prepended to the demand identifier to form a pool name.
pub const DEFAULT_NAME_PREFIX: &str = "pool-";

/// Label carrying the capacity type requirement on created pools.
pub const CAPACITY_TYPE_KEY: &str = "karpenter.sh/capacity-type";

/// How a pool taint is compared against a workload's demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Any taint whose value equals the demand identifier matches,
    /// whatever its key.
    #[default]
    ValueOnly,
    /// The taint key must also equal the demand key.
    KeyAndValue,
}

/// Decision-engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    pub demand_key: String,
    pub name_prefix: String,
    pub match_policy: MatchPolicy,
    /// Re-check delay after the demand was already matched by a pool.
    pub matched_requeue_secs: u64,
    /// Re-check delay after a pool was created (or found to exist).
    pub provisioned_requeue_secs: u64,
    pub pool: PoolDefaults,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            demand_key: DEFAULT_DEMAND_KEY.to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            match_policy: MatchPolicy::default(),
            matched_requeue_secs: 5,
            provisioned_requeue_secs: 10,
            pool: PoolDefaults::default(),
        }
    }
}

impl ProvisionerConfig {
    pub fn matched_requeue(&self) -> Duration {
        Duration::from_secs(self.matched_requeue_secs)
    }

    pub fn provisioned_requeue(&self) -> Duration {
        Duration::from_secs(self.provisioned_requeue_secs)
    }

    /// Deterministic pool name for a demand identifier.
    pub fn pool_name(&self, demand: &str) -> String {
        format!("{}{}", self.name_prefix, demand)
    }
}

/// Shape of every pool the provisioner creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolDefaults {
    /// Accepted values for the capacity type requirement.
    pub capacity_types: Vec<String>,
    pub expire_after: String,
    /// Nodes that may be disrupted at once, absolute or percentage.
    pub budget_nodes: String,
    pub consolidate_after: String,
    pub consolidation_policy: ConsolidationPolicy,
    /// Capacity ceiling per resource (e.g. `cpu = "12000m"`).
    pub limits: BTreeMap<String, String>,
    pub node_class: NodeClassRef,
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self {
            capacity_types: vec!["spot".to_string()],
            expire_after: "24h".to_string(),
            budget_nodes: "10%".to_string(),
            consolidate_after: "10m".to_string(),
            consolidation_policy: ConsolidationPolicy::WhenEmpty,
            limits: BTreeMap::from([
                ("cpu".to_string(), "12000m".to_string()),
                ("memory".to_string(), "64Gi".to_string()),
            ]),
            node_class: NodeClassRef {
                group: "karpenter.k8s.aws".to_string(),
                kind: "EC2NodeClass".to_string(),
                name: "custom".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.demand_key, "provision-for-team");
        assert_eq!(config.match_policy, MatchPolicy::ValueOnly);
        assert_eq!(config.matched_requeue(), Duration::from_secs(5));
        assert_eq!(config.provisioned_requeue(), Duration::from_secs(10));
        assert_eq!(config.pool.limits["memory"], "64Gi");
    }

    #[test]
    fn pool_name_uses_prefix() {
        let mut config = ProvisionerConfig::default();
        assert_eq!(config.pool_name("payments"), "pool-payments");

        config.name_prefix = "nodepool-".to_string();
        assert_eq!(config.pool_name("payments"), "nodepool-payments");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProvisionerConfig = toml::from_str(
            r#"
match_policy = "key-and-value"
matched_requeue_secs = 30

[pool]
capacity_types = ["on-demand", "spot"]
"#,
        )
        .unwrap();

        assert_eq!(config.match_policy, MatchPolicy::KeyAndValue);
        assert_eq!(config.matched_requeue_secs, 30);
        assert_eq!(config.provisioned_requeue_secs, 10);
        assert_eq!(config.pool.capacity_types, vec!["on-demand", "spot"]);
        assert_eq!(config.pool.node_class.name, "custom");
    }
}
