//! Reconciler error types.
//!
//! Every variant is fatal for the current pass only. The engine never
//! retries; the dispatcher backs off and re-delivers the trigger.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch workload {workload}: {source}")]
    WorkloadUnavailable {
        workload: String,
        #[source]
        source: StoreError,
    },

    #[error("pool catalog unavailable: {0}")]
    CatalogUnavailable(#[source] StoreError),

    #[error("creation of pool {pool} failed: {source}")]
    CreateRejected {
        pool: String,
        #[source]
        source: StoreError,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
