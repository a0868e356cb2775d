//! StateStore — redb-backed persistence for workloads and node pools.
//!
//! All values are JSON documents in redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe resource store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.open_table(POOLS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Workloads ──────────────────────────────────────────────────

    /// Insert or update a workload.
    ///
    /// Namespace and name must be DNS-1123 labels; anything else is
    /// `StateError::Invalid` and nothing is written.
    pub fn put_workload(&self, workload: &Workload) -> StateResult<()> {
        workload.validate().map_err(StateError::Invalid)?;
        let key = workload.table_key();
        let value = serde_json::to_vec(workload).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, phase = ?workload.phase, "workload stored");
        Ok(())
    }

    /// Get a workload by `{namespace}/{name}` key.
    pub fn get_workload(&self, key: &str) -> StateResult<Option<Workload>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        let guard = table.get(key).map_err(map_err!(Read))?;
        guard.map(|g| decode_workload(g.value())).transpose()
    }

    /// List all workloads.
    pub fn list_workloads(&self) -> StateResult<Vec<Workload>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        table
            .iter()
            .map_err(map_err!(Read))?
            .map(|entry| {
                let (_, value) = entry.map_err(map_err!(Read))?;
                decode_workload(value.value())
            })
            .collect()
    }

    /// List workloads still waiting for capacity.
    pub fn list_pending_workloads(&self) -> StateResult<Vec<Workload>> {
        Ok(self
            .list_workloads()?
            .into_iter()
            .filter(Workload::is_pending)
            .collect())
    }

    /// Delete a workload by key. Returns true if it existed.
    pub fn delete_workload(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "workload deleted");
        Ok(existed)
    }

    // ── Pools ──────────────────────────────────────────────────────

    /// Create a pool. Fails with `AlreadyExists` if the name is taken.
    ///
    /// The existence check and the insert share one write transaction, so
    /// of two concurrent creates for the same name exactly one succeeds.
    pub fn create_pool(&self, pool: &Pool) -> StateResult<()> {
        let name = pool.name();
        validate_pool_name(name).map_err(StateError::Invalid)?;
        let value = serde_json::to_vec(pool).map_err(map_err!(Serialize))?;
        self.insert_pool_if_absent(name, &value)?;
        debug!(pool = %name, "pool created");
        Ok(())
    }

    /// Import a pool document managed elsewhere.
    ///
    /// The body is stored as-is. It does not have to match the typed
    /// `Pool` shape.
    pub fn put_pool_object(&self, object: &PoolObject) -> StateResult<()> {
        validate_pool_name(&object.name).map_err(StateError::Invalid)?;
        let value = serde_json::to_vec(&object.body).map_err(map_err!(Serialize))?;
        self.insert_pool_if_absent(&object.name, &value)?;
        debug!(pool = %object.name, "pool imported");
        Ok(())
    }

    fn insert_pool_if_absent(&self, name: &str, value: &[u8]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(POOLS).map_err(map_err!(Table))?;
            if table.get(name).map_err(map_err!(Read))?.is_some() {
                return Err(StateError::AlreadyExists(name.to_string()));
            }
            table.insert(name, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a pool document by name.
    pub fn get_pool_object(&self, name: &str) -> StateResult<Option<PoolObject>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(POOLS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let body: serde_json::Value =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(PoolObject {
                    name: name.to_string(),
                    body,
                }))
            }
            None => Ok(None),
        }
    }

    /// List every pool document in the catalog.
    pub fn list_pool_objects(&self) -> StateResult<Vec<PoolObject>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(POOLS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let body: serde_json::Value =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(PoolObject {
                name: key.value().to_string(),
                body,
            });
        }
        Ok(results)
    }
}

fn decode_workload(bytes: &[u8]) -> StateResult<Workload> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}
