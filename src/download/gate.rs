//! Admission control bounding the number of simultaneous transfers.
//!
//! [`ConcurrencyGate`] wraps a [`tokio::sync::Semaphore`]. A [`GatePermit`]
//! returns its slot when dropped, so every exit path of an attempt (normal
//! return, `?` propagation, task cancellation) releases exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Error returned when a permit cannot be acquired.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The gate was closed via [`ConcurrencyGate::close`] and no longer
    /// admits anyone.
    #[error("concurrency gate closed")]
    Closed,
}

/// Bounded counting gate shared by every job of a run.
///
/// Tokio's semaphore is fair (FIFO), so a waiter is admitted as soon as the
/// permits ahead of it are released and no job starves.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<GateCounters>,
}

#[derive(Debug, Default)]
struct GateCounters {
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

/// A held slot in the gate. Dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl ConcurrencyGate {
    /// Creates a gate admitting at most `capacity` holders at once.
    ///
    /// A capacity of zero is raised to one so the gate can always make progress.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(GateCounters::default()),
        }
    }

    /// Waits until a slot is free, then takes it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Closed`] if [`close`](Self::close) was called.
    pub async fn acquire(&self) -> Result<GatePermit, GateError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed)?;

        let held = self.counters.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(held, Ordering::SeqCst);
        trace!(held, capacity = self.capacity, "gate permit acquired");

        Ok(GatePermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Closes the gate: pending and future `acquire` calls fail.
    ///
    /// The CLI never calls this. It lets tests and embedding callers stop
    /// admission; jobs then end `Failed` without another attempt.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.counters.in_use.load(Ordering::SeqCst)
    }

    /// Returns the highest number of permits ever held at the same time.
    #[must_use]
    pub fn peak_in_use(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Decrement before the semaphore permit field drops, so `in_use`
        // never reads above capacity while a waiter is being admitted.
        self.counters.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}
