//! poolsmith-queue — trigger dispatch for the reconciler.
//!
//! A [`WorkQueue`] hands workload keys to reconcile workers. It provides
//! the guarantees the reconciler relies on from its caller:
//!
//! - a key is queued at most once, however many triggers arrive for it
//! - a key is never handed to two workers at the same time; triggers that
//!   arrive while it is being processed are replayed when it is `done`
//! - re-checks are delivered after the delay the reconciler asked for;
//!   a key has at most one delayed re-add pending and the earliest wins
//! - failing keys are retried with exponential [`Backoff`]
//!
//! # Worker protocol
//!
//! ```text
//! while let Some(key) = queue.get().await {
//!     match reconcile(&key) {
//!         Ok(None)        => queue.forget(&key),
//!         Ok(Some(delay)) => { queue.forget(&key); queue.add_after(&key, delay) }
//!         Err(_)          => queue.add_rate_limited(&key),
//!     }
//!     queue.done(&key);
//! }
//! ```

pub mod backoff;
pub mod queue;

pub use backoff::Backoff;
pub use queue::WorkQueue;
