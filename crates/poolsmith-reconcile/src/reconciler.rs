//! Reconciler — one level-triggered pass per workload trigger.
//!
//! Each pass recomputes its decision from the workload and the catalog as
//! they are now. The reconciler holds no per-workload state, so passes for
//! the same or different workloads may run concurrently.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use poolsmith_state::WorkloadPhase;

use crate::config::ProvisionerConfig;
use crate::demand::extract_demand;
use crate::error::{ReconcileError, ReconcileResult};
use crate::matcher::find_matching_pool;
use crate::provisioner::{Provisioned, provision};
use crate::store::{ResourceStore, StoreError};

/// Where a pass ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The workload no longer exists.
    WorkloadGone,
    /// The workload is not waiting for capacity.
    NotPending(WorkloadPhase),
    /// The workload declares no demand.
    NoDemand,
    /// An existing pool already serves the demand.
    Matched { demand: String, pool: String },
    /// A pool for the demand was created, or found to exist by name.
    Provisioned {
        demand: String,
        pool: String,
        created: bool,
    },
}

/// Result of a successful pass: the outcome and when to look again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: Outcome,
    /// `None` means no re-check is needed.
    pub requeue_after: Option<Duration>,
}

impl Reconciled {
    fn done(outcome: Outcome) -> Self {
        Self {
            outcome,
            requeue_after: None,
        }
    }

    fn requeue(outcome: Outcome, after: Duration) -> Self {
        Self {
            outcome,
            requeue_after: Some(after),
        }
    }
}

/// The pool provisioning decision engine.
pub struct Reconciler<S> {
    store: S,
    config: Arc<ProvisionerConfig>,
}

impl<S: ResourceStore> Reconciler<S> {
    pub fn new(store: S, config: ProvisionerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass for the workload with the given id.
    pub async fn reconcile(&self, workload_id: &str) -> ReconcileResult<Reconciled> {
        let workload = match self.store.get_workload(workload_id).await {
            Ok(w) => w,
            Err(StoreError::NotFound(_)) => {
                info!(workload = %workload_id, "workload not found, ignoring");
                return Ok(Reconciled::done(Outcome::WorkloadGone));
            }
            Err(e) => {
                warn!(workload = %workload_id, error = %e, "failed to fetch workload");
                return Err(ReconcileError::WorkloadUnavailable {
                    workload: workload_id.to_string(),
                    source: e,
                });
            }
        };

        if !workload.is_pending() {
            debug!(workload = %workload_id, phase = ?workload.phase, "workload not pending");
            return Ok(Reconciled::done(Outcome::NotPending(workload.phase)));
        }
        info!(workload = %workload_id, "workload is pending");

        let config = &self.config;
        let Some(demand) = extract_demand(&workload.node_selector, &config.demand_key) else {
            info!(workload = %workload_id, key = %config.demand_key, "no pool demand declared");
            return Ok(Reconciled::done(Outcome::NoDemand));
        };

        let matched = find_matching_pool(
            &self.store,
            config.match_policy,
            &config.demand_key,
            &demand,
        )
        .await?;

        if let Some(pool) = matched {
            return Ok(Reconciled::requeue(
                Outcome::Matched { demand, pool },
                config.matched_requeue(),
            ));
        }

        let result = provision(&self.store, config, &demand).await?;
        let pool = config.pool_name(&demand);
        info!(
            workload = %workload_id,
            %pool,
            created = result == Provisioned::Created,
            "demand provisioned"
        );
        Ok(Reconciled::requeue(
            Outcome::Provisioned {
                demand,
                pool,
                created: result == Provisioned::Created,
            },
            config.provisioned_requeue(),
        ))
    }
}
