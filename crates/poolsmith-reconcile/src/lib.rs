//! poolsmith-reconcile — the pool provisioning decision engine.
//!
//! One reconciliation pass takes a workload id and answers a single
//! question: does a node pool exist for the workload's declared demand,
//! and if not, which pool must be created?
//!
//! # Pipeline
//!
//! ```text
//! get_workload(id)          NotFound      → no-op
//!   phase != Pending                      → no-op
//! extract_demand(selector)  None          → no-op, no re-check
//! find_matching_pool(D)     Some(pool)    → re-check after matched_requeue
//! provision(D)              created/exists→ re-check after provisioned_requeue
//! any store failure                       → Err, caller backs off
//! ```
//!
//! The pass is recomputed from scratch on every trigger. Nothing is
//! remembered between passes, so missed or duplicated triggers are
//! harmless. Pool names are derived deterministically from the demand, and
//! an `AlreadyExists` answer from the store counts as success. That name
//! collision is the only synchronization between concurrent passes.

pub mod config;
pub mod convert;
pub mod demand;
pub mod error;
pub mod matcher;
pub mod provisioner;
pub mod reconciler;
pub mod store;

pub use config::{MatchPolicy, PoolDefaults, ProvisionerConfig};
pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{Outcome, Reconciled, Reconciler};
pub use store::{ResourceStore, StoreError, StoreResult};
