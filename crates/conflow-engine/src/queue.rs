//! Mutation serialization queue.
//!
//! One mutation runs at a time, in the order callers arrived. The gate is an
//! owned value so each store gets its own queue and tests can build fresh
//! ones.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

/// FIFO admission gate for read-modify-write operations
#[derive(Debug, Default)]
pub struct MutationQueue {
    // tokio's Mutex grants the lock to waiters in request order.
    gate: Mutex<()>,
    pending: AtomicUsize,
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once every previously submitted task has finished.
    ///
    /// The gate is released however `task` ends, including on error,
    /// panic, or cancellation of the returned future.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let _pending = PendingGuard(&self.pending);
        let _gate = self.gate.lock().await;
        task.await
    }

    /// Tasks submitted and not yet finished, including the running one
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}
