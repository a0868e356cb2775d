//! poolsmithd — daemon wiring for the pool provisioner.
//!
//! The binary in `main.rs` is a thin CLI over these modules so the
//! controller loop can be exercised from integration tests.

pub mod config;
pub mod controller;

pub use config::{ControllerConfig, DaemonConfig};
pub use controller::{Controller, enqueue_pending, process_next, run_resync};
