//! The resource store the engine reads from and writes to.
//!
//! The engine only needs three calls: fetch one workload, list the pool
//! catalog, and create a pool. Anything that can answer those (the
//! embedded redb store, a remote API, a test double) can drive it.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use poolsmith_state::{Pool, PoolObject, StateError, StateStore, Workload};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures, classified by how the engine reacts to them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An object with the same name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The store refused the request (validation or authorization).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The store could not be reached or failed internally.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Read/list/create access to workloads and pools.
pub trait ResourceStore: Send + Sync {
    /// Fetch a workload by id. Missing workloads are `StoreError::NotFound`.
    fn get_workload(&self, id: &str) -> impl Future<Output = StoreResult<Workload>> + Send;

    /// List the full pool catalog. May lag behind concurrent writers.
    fn list_pools(&self) -> impl Future<Output = StoreResult<Vec<PoolObject>>> + Send;

    /// Create a pool, failing with `StoreError::AlreadyExists` on a name clash.
    fn create_pool(&self, pool: &Pool) -> impl Future<Output = StoreResult<()>> + Send;
}

impl<S: ResourceStore> ResourceStore for Arc<S> {
    fn get_workload(&self, id: &str) -> impl Future<Output = StoreResult<Workload>> + Send {
        (**self).get_workload(id)
    }

    fn list_pools(&self) -> impl Future<Output = StoreResult<Vec<PoolObject>>> + Send {
        (**self).list_pools()
    }

    fn create_pool(&self, pool: &Pool) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).create_pool(pool)
    }
}

impl From<StateError> for StoreError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::NotFound(what) => StoreError::NotFound(what),
            StateError::AlreadyExists(what) => StoreError::AlreadyExists(what),
            StateError::Invalid(msg) | StateError::Serialize(msg) => StoreError::Rejected(msg),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl ResourceStore for StateStore {
    async fn get_workload(&self, id: &str) -> StoreResult<Workload> {
        StateStore::get_workload(self, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_pools(&self) -> StoreResult<Vec<PoolObject>> {
        Ok(self.list_pool_objects()?)
    }

    async fn create_pool(&self, pool: &Pool) -> StoreResult<()> {
        Ok(StateStore::create_pool(self, pool)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_are_classified() {
        assert_eq!(
            StoreError::from(StateError::AlreadyExists("pool-a".to_string())),
            StoreError::AlreadyExists("pool-a".to_string())
        );
        assert!(matches!(
            StoreError::from(StateError::Invalid("bad name".to_string())),
            StoreError::Rejected(_)
        ));
        assert!(matches!(
            StoreError::from(StateError::Transaction("io".to_string())),
            StoreError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn state_store_reports_missing_workload_as_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        let err = ResourceStore::get_workload(&store, "default/ghost")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("default/ghost".to_string()));
    }
}
