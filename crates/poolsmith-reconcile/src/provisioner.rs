//! Pool provisioning.
//!
//! Builds the pool for an unmatched demand and submits it once. The name
//! is a pure function of the demand, so a second submission for the same
//! demand collides instead of duplicating; that collision is reported as
//! [`Provisioned::AlreadyExisted`], not as an error.

use tracing::{error, info};

use poolsmith_state::{
    DisruptionBudget, Disruption, NodeRequirement, POOL_API_VERSION, POOL_KIND, Pool,
    PoolMetadata, PoolSpec, PoolTemplate, PoolTemplateSpec, RequirementOperator, Taint,
    TaintEffect,
};

use crate::config::{CAPACITY_TYPE_KEY, ProvisionerConfig};
use crate::error::{ReconcileError, ReconcileResult};
use crate::store::{ResourceStore, StoreError};

/// How a provisioning attempt was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// This pass created the pool.
    Created,
    /// A pool with the derived name was already there.
    AlreadyExisted,
}

/// Build the pool that serves `demand`.
///
/// The pool carries exactly one taint, `{demand_key}={demand}:NoSchedule`,
/// so only workloads declaring this demand land on it.
pub fn build_pool(config: &ProvisionerConfig, demand: &str) -> Pool {
    let defaults = &config.pool;
    Pool {
        api_version: POOL_API_VERSION.to_string(),
        kind: POOL_KIND.to_string(),
        metadata: PoolMetadata {
            name: config.pool_name(demand),
        },
        spec: PoolSpec {
            limits: defaults.limits.clone(),
            template: PoolTemplate {
                spec: PoolTemplateSpec {
                    taints: vec![Taint {
                        key: config.demand_key.clone(),
                        value: demand.to_string(),
                        effect: TaintEffect::NoSchedule,
                    }],
                    node_class_ref: defaults.node_class.clone(),
                    requirements: vec![NodeRequirement {
                        key: CAPACITY_TYPE_KEY.to_string(),
                        operator: RequirementOperator::In,
                        values: defaults.capacity_types.clone(),
                    }],
                    expire_after: defaults.expire_after.clone(),
                },
            },
            disruption: Disruption {
                budgets: vec![DisruptionBudget {
                    nodes: defaults.budget_nodes.clone(),
                }],
                consolidate_after: defaults.consolidate_after.clone(),
                consolidation_policy: defaults.consolidation_policy,
            },
        },
    }
}

/// Build and submit the pool for `demand`. One attempt, no retries.
pub async fn provision<S: ResourceStore>(
    store: &S,
    config: &ProvisionerConfig,
    demand: &str,
) -> ReconcileResult<Provisioned> {
    let pool = build_pool(config, demand);
    let name = pool.name().to_string();

    match store.create_pool(&pool).await {
        Ok(()) => {
            info!(pool = %name, %demand, "pool created");
            Ok(Provisioned::Created)
        }
        Err(StoreError::AlreadyExists(_)) => {
            info!(pool = %name, %demand, "pool already exists");
            Ok(Provisioned::AlreadyExisted)
        }
        Err(e) => {
            error!(pool = %name, %demand, error = %e, "failed to create pool");
            Err(ReconcileError::CreateRejected {
                pool: name,
                source: e,
            })
        }
    }
}
