//! Bounded concurrency gate.
//!
//! A `Gate` caps how many tasks may be in flight at once (via a semaphore)
//! while separately letting a caller block until every task it admitted has
//! finished — the `add()`/`done()`/`wait()` join contract an unbounded
//! `tokio::spawn` fan-out doesn't give you. The replication loop nests two
//! gates: an outer one bounding concurrent repositories, an inner one
//! bounding concurrent blob transfers within a tag.

use std::sync::Arc;
use tokio::sync::{watch, Semaphore};


/// A capacity-bounded join gate.
#[derive(Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
    pending_tx: watch::Sender<u64>,
}

impl Gate {
    /// Creates a gate that admits at most `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        let (pending_tx, _) = watch::channel(0);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            pending_tx,
        }
    }

    /// Reserves a slot, blocking until the gate has capacity available.
    /// Returns a guard; dropping it (or calling [`GateGuard::done`]
    /// explicitly) releases the slot and counts toward [`Gate::wait`].
    pub async fn add(&self) -> GateGuard {
        self.pending_tx.send_modify(|n| *n += 1);
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");
        GateGuard {
            _permit: permit,
            pending_tx: self.pending_tx.clone(),
        }
    }

    /// Blocks until every guard handed out by [`Gate::add`] has been
    /// dropped. Safe to call concurrently with more `add()` calls; it only
    /// observes the count, so it returns once the count it observes hits
    /// zero, not necessarily when the gate is permanently idle.
    pub async fn wait(&self) {
        let mut rx = self.pending_tx.subscribe();
        loop {
            if *rx.borrow() == 0 {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Current number of outstanding (not-yet-dropped) guards.
    pub fn pending(&self) -> u64 {
        *self.pending_tx.subscribe().borrow()
    }
}

/// A reserved gate slot. Dropping it releases capacity back to the gate.
pub struct GateGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
    pending_tx: watch::Sender<u64>,
}

impl GateGuard {
    /// Releases the slot early. Equivalent to dropping the guard.
    pub fn done(self) {
        drop(self)
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.pending_tx.send_modify(|n| *n = n.saturating_sub(1));
    }
}
