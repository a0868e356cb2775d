//! WorkQueue — keyed, de-duplicating, delay-capable trigger queue.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::backoff::Backoff;

/// Cloneable handle to a shared work queue.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<QueueState>,
    notify: Notify,
    backoff: Backoff,
}

#[derive(Default)]
struct QueueState {
    /// Keys ready to hand out, in arrival order.
    ready: VecDeque<String>,
    /// Keys that need processing (queued or waiting for `done`).
    dirty: HashSet<String>,
    /// Keys currently held by a worker.
    processing: HashSet<String>,
    /// Consecutive failure count per key.
    failures: HashMap<String, u32>,
    /// Deadline of the one delayed add pending per key.
    waiting: HashMap<String, Instant>,
    shutting_down: bool,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new(Backoff::default())
    }
}

impl WorkQueue {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
                backoff,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a key now. No-op if it is already queued or after shutdown.
    ///
    /// Supersedes any delayed add pending for the key.
    pub fn add(&self, key: &str) {
        let mut state = self.lock();
        if state.shutting_down {
            return;
        }
        state.waiting.remove(key);
        if state.dirty.contains(key) {
            return;
        }
        state.dirty.insert(key.to_string());
        if state.processing.contains(key) {
            // Replayed by `done`.
            trace!(%key, "key in flight, deferring");
            return;
        }
        state.ready.push_back(key.to_string());
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Queue a key once `delay` has elapsed.
    ///
    /// Each key has at most one delayed add pending; when one is already
    /// due no later than the new deadline, this call is a no-op. An
    /// earlier deadline replaces a later one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_after(&self, key: &str, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let deadline = Instant::now() + delay;
        {
            let mut state = self.lock();
            if state.shutting_down {
                return;
            }
            if state.waiting.get(key).is_some_and(|&due| due <= deadline) {
                trace!(%key, "delayed add already pending");
                return;
            }
            state.waiting.insert(key.to_string(), deadline);
        }

        let queue = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            queue.fire(&key, deadline);
        });
    }

    /// Timer callback: add the key unless its deadline was superseded.
    fn fire(&self, key: &str, deadline: Instant) {
        {
            let mut state = self.lock();
            if state.waiting.get(key) != Some(&deadline) {
                return;
            }
            state.waiting.remove(key);
        }
        self.add(key);
    }

    /// Whether a delayed add is pending for `key`.
    pub fn is_waiting(&self, key: &str) -> bool {
        self.lock().waiting.contains_key(key)
    }

    /// Record a failure for `key` and queue it after the backoff delay.
    ///
    /// Returns the delay chosen.
    pub fn add_rate_limited(&self, key: &str) -> Duration {
        let failures = {
            let mut state = self.lock();
            let count = state.failures.entry(key.to_string()).or_insert(0);
            *count = count.saturating_add(1);
            *count
        };
        let delay = self.inner.backoff.delay(failures);
        debug!(%key, failures, delay_ms = delay.as_millis() as u64, "retrying with backoff");
        self.add_after(key, delay);
        delay
    }

    /// Clear the failure count for `key`.
    pub fn forget(&self, key: &str) {
        self.lock().failures.remove(key);
    }

    /// Consecutive failures recorded for `key`.
    pub fn failures(&self, key: &str) -> u32 {
        self.lock().failures.get(key).copied().unwrap_or(0)
    }

    /// Wait for the next key.
    ///
    /// Returns `None` once the queue is shut down and no keys remain.
    /// The caller owns the key until it calls [`done`](Self::done).
    pub async fn get(&self) -> Option<String> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(key) = state.ready.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Release a key taken with [`get`](Self::get).
    pub fn done(&self, key: &str) {
        let mut state = self.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) && !state.shutting_down {
            state.ready.push_back(key.to_string());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Stop accepting keys and wake every waiting worker.
    pub fn shutdown(&self) {
        self.lock().shutting_down = true;
        self.inner.notify.notify_waiters();
        debug!("work queue shutting down");
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Number of keys ready to hand out.
    pub fn len(&self) -> usize {
        self.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
