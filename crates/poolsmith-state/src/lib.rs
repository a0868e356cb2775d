//! poolsmith-state — embedded resource store for poolsmith.
//!
//! Backed by [redb](https://docs.rs/redb), holds the two resource kinds the
//! provisioner reads and writes: workloads and node pools.
//!
//! # Architecture
//!
//! Workloads are JSON-serialized under `{namespace}/{name}` keys. Pools are
//! stored as raw JSON documents keyed by pool name, so entries written by
//! other systems survive even when they do not fit the typed [`Pool`]
//! model. Typed pools go in through [`StateStore::create_pool`], which is
//! the only create-if-absent operation in the store.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
