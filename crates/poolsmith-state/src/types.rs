//! Domain types for the poolsmith resource store.
//!
//! `Workload` is the unit of demand. `Pool` is the typed, versioned shape
//! of a node pool as poolsmith creates it. `PoolObject` is the untyped
//! form every catalog entry is returned in, whoever wrote it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// API version written on every pool poolsmith creates.
pub const POOL_API_VERSION: &str = "karpenter.sh/v1";

/// Resource kind written on every pool poolsmith creates.
pub const POOL_KIND: &str = "NodePool";

/// Unique identifier for a workload (`{namespace}/{name}`).
pub type WorkloadId = String;

// ── Workload ──────────────────────────────────────────────────────

/// A unit of scheduled work waiting for (or running on) capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub phase: WorkloadPhase,
    /// Scheduling constraints: label key → required value.
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    /// Unix timestamp (seconds) when this workload was submitted.
    #[serde(default)]
    pub created_at: u64,
}

/// Lifecycle phase of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Workload {
    /// Build the composite key for the workloads table.
    pub fn table_key(&self) -> WorkloadId {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn is_pending(&self) -> bool {
        self.phase == WorkloadPhase::Pending
    }

    /// Both key parts must be DNS-1123 labels.
    pub fn validate(&self) -> Result<(), String> {
        validate_label(&self.namespace).map_err(|e| format!("namespace: {e}"))?;
        validate_label(&self.name).map_err(|e| format!("name: {e}"))
    }
}

// ── Pool ──────────────────────────────────────────────────────────

/// A node pool definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub api_version: String,
    pub kind: String,
    pub metadata: PoolMetadata,
    pub spec: PoolSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    /// Capacity ceiling: resource name → quantity (e.g. `cpu` → `12000m`).
    pub limits: BTreeMap<String, String>,
    pub template: PoolTemplate,
    pub disruption: Disruption,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolTemplate {
    pub spec: PoolTemplateSpec,
}

/// Shape of the nodes a pool launches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolTemplateSpec {
    pub taints: Vec<Taint>,
    pub node_class_ref: NodeClassRef,
    pub requirements: Vec<NodeRequirement>,
    /// Maximum node lifetime (e.g. `24h`).
    pub expire_after: String,
}

/// A pool constraint. Only workloads tolerating it are placed on the pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

/// Reference to the cloud-specific node class a pool launches from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeClassRef {
    pub group: String,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRequirement {
    pub key: String,
    pub operator: RequirementOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// How and when unused pool capacity is reclaimed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Disruption {
    pub budgets: Vec<DisruptionBudget>,
    /// Idle time before consolidation (e.g. `10m`).
    pub consolidate_after: String,
    pub consolidation_policy: ConsolidationPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisruptionBudget {
    /// Nodes that may be disrupted at once, absolute or percentage.
    pub nodes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationPolicy {
    WhenEmpty,
    WhenEmptyOrUnderutilized,
}

impl Pool {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn taints(&self) -> &[Taint] {
        &self.spec.template.spec.taints
    }
}

/// A catalog entry as the store returns it: name plus the raw document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolObject {
    pub name: String,
    pub body: serde_json::Value,
}

/// Check a pool name against DNS-1123 subdomain rules.
pub fn validate_pool_name(name: &str) -> Result<(), String> {
    if name.len() > 253 {
        return Err(format!("name {name:?} is longer than 253 characters"));
    }
    check_dns_chars(name, true)
}

/// Check a namespace or workload name against DNS-1123 label rules.
///
/// Labels never contain `/` or `.`, so `{namespace}/{name}` keys stay
/// unambiguous.
pub fn validate_label(value: &str) -> Result<(), String> {
    if value.len() > 63 {
        return Err(format!("name {value:?} is longer than 63 characters"));
    }
    check_dns_chars(value, false)
}

fn check_dns_chars(name: &str, allow_dot: bool) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if let Some(c) = name
        .chars()
        .find(|&c| !(alnum(c) || c == '-' || (allow_dot && c == '.')))
    {
        return Err(format!("name {name:?} contains invalid character {c:?}"));
    }
    if !name.starts_with(alnum) || !name.ends_with(alnum) {
        return Err(format!(
            "name {name:?} must start and end with an alphanumeric character"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_serializes_with_camel_case_fields() {
        let pool = Pool {
            api_version: POOL_API_VERSION.to_string(),
            kind: POOL_KIND.to_string(),
            metadata: PoolMetadata {
                name: "pool-payments".to_string(),
            },
            spec: PoolSpec {
                limits: BTreeMap::from([("cpu".to_string(), "12000m".to_string())]),
                template: PoolTemplate {
                    spec: PoolTemplateSpec {
                        taints: vec![Taint {
                            key: "provision-for-team".to_string(),
                            value: "payments".to_string(),
                            effect: TaintEffect::NoSchedule,
                        }],
                        node_class_ref: NodeClassRef {
                            group: "karpenter.k8s.aws".to_string(),
                            kind: "EC2NodeClass".to_string(),
                            name: "custom".to_string(),
                        },
                        requirements: vec![],
                        expire_after: "24h".to_string(),
                    },
                },
                disruption: Disruption {
                    budgets: vec![DisruptionBudget {
                        nodes: "10%".to_string(),
                    }],
                    consolidate_after: "10m".to_string(),
                    consolidation_policy: ConsolidationPolicy::WhenEmpty,
                },
            },
        };

        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["apiVersion"], "karpenter.sh/v1");
        assert_eq!(json["spec"]["template"]["spec"]["nodeClassRef"]["kind"], "EC2NodeClass");
        assert_eq!(json["spec"]["template"]["spec"]["taints"][0]["effect"], "NoSchedule");
        assert_eq!(json["spec"]["disruption"]["consolidationPolicy"], "WhenEmpty");
        assert_eq!(json["spec"]["template"]["spec"]["expireAfter"], "24h");
    }

    #[test]
    fn workload_defaults_missing_selector() {
        let w: Workload = serde_json::from_str(
            r#"{"namespace":"default","name":"web","phase":"Pending"}"#,
        )
        .unwrap();
        assert!(w.node_selector.is_empty());
        assert!(w.is_pending());
        assert_eq!(w.table_key(), "default/web");
    }

    #[test]
    fn pool_name_validation() {
        assert!(validate_pool_name("pool-payments").is_ok());
        assert!(validate_pool_name("pool-a.b-1").is_ok());
        assert!(validate_pool_name("").is_err());
        assert!(validate_pool_name("pool-Payments").is_err());
        assert!(validate_pool_name("pool-").is_err());
        assert!(validate_pool_name("pool payments").is_err());
        assert!(validate_pool_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn workload_key_parts_must_be_labels() {
        let mut w: Workload = serde_json::from_str(
            r#"{"namespace":"default","name":"web","phase":"Pending"}"#,
        )
        .unwrap();
        assert!(w.validate().is_ok());

        // Either split would collide on the key "a/b/c".
        w.namespace = "a".to_string();
        w.name = "b/c".to_string();
        assert!(w.validate().is_err());
        w.namespace = "a/b".to_string();
        w.name = "c".to_string();
        assert!(w.validate().is_err());

        assert!(validate_label("web.v2").is_err());
        assert!(validate_label(&"a".repeat(64)).is_err());
        assert!(validate_label(&"a".repeat(63)).is_ok());
    }
}
