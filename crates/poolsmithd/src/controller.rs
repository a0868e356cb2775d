//! Controller — drives the reconciler from the work queue.
//!
//! Workers pull workload keys, run one reconcile pass each, and turn the
//! result into queue operations: a requested re-check becomes a delayed
//! re-add, an error becomes a backed-off retry. A resync loop re-enqueues
//! every pending workload periodically so a lost trigger is only ever
//! delayed, never dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use poolsmith_queue::WorkQueue;
use poolsmith_reconcile::{Reconciler, ResourceStore};
use poolsmith_state::StateStore;

/// Runs reconcile workers against a shared queue.
pub struct Controller<S> {
    reconciler: Arc<Reconciler<S>>,
    queue: WorkQueue,
    workers: usize,
}

impl<S: ResourceStore + 'static> Controller<S> {
    pub fn new(reconciler: Reconciler<S>, queue: WorkQueue, workers: usize) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            queue,
            workers: workers.max(1),
        }
    }

    /// Spawn the workers and block until shutdown, then drain them.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(workers = self.workers, "controller started");

        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|worker| {
                let reconciler = self.reconciler.clone();
                let queue = self.queue.clone();
                tokio::spawn(async move {
                    while process_next(&reconciler, &queue).await {}
                    debug!(worker, "worker stopped");
                })
            })
            .collect();

        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }

        info!("controller shutting down");
        self.queue.shutdown();
        for handle in handles {
            let _ = handle.await;
        }
        info!("controller stopped");
    }
}

/// Take one key from the queue and reconcile it.
///
/// Returns false once the queue has shut down.
pub async fn process_next<S: ResourceStore>(
    reconciler: &Reconciler<S>,
    queue: &WorkQueue,
) -> bool {
    let Some(key) = queue.get().await else {
        return false;
    };

    match reconciler.reconcile(&key).await {
        Ok(reconciled) => {
            queue.forget(&key);
            if let Some(delay) = reconciled.requeue_after {
                debug!(workload = %key, delay_secs = delay.as_secs(), "re-check scheduled");
                queue.add_after(&key, delay);
            }
        }
        Err(e) => {
            let delay = queue.add_rate_limited(&key);
            error!(
                workload = %key,
                error = %e,
                retry_ms = delay.as_millis() as u64,
                "reconcile failed"
            );
        }
    }

    queue.done(&key);
    true
}

/// Enqueue every pending workload in the store. Returns how many.
pub fn enqueue_pending(store: &StateStore, queue: &WorkQueue) -> usize {
    match store.list_pending_workloads() {
        Ok(workloads) => {
            for workload in &workloads {
                queue.add(&workload.table_key());
            }
            workloads.len()
        }
        Err(e) => {
            warn!(error = %e, "failed to list pending workloads");
            0
        }
    }
}

/// Periodically re-enqueue pending workloads until shutdown.
pub async fn run_resync(
    store: StateStore,
    queue: WorkQueue,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(interval_secs = interval.as_secs(), "resync started");

    let count = enqueue_pending(&store, &queue);
    debug!(count, "initial sync");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let count = enqueue_pending(&store, &queue);
                debug!(count, "resync");
            }
            _ = shutdown.changed() => {
                info!("resync shutting down");
                break;
            }
        }
    }
}
