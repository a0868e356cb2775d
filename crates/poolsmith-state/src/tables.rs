//! redb table definitions for the poolsmith resource store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON documents).

use redb::TableDefinition;

/// Workloads keyed by `{namespace}/{name}`.
pub const WORKLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("workloads");

/// Node pools keyed by pool name. Values are untyped JSON.
pub const POOLS: TableDefinition<&str, &[u8]> = TableDefinition::new("pools");
