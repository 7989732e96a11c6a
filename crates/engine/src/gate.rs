// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-wide parallelism gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded counting semaphore limiting concurrently running step runtimes.
///
/// Only step runtimes take slots: one per lifetime, released exactly once on
/// reaching a terminal state. The release-once invariant is enforced by the
/// step's slot flag, not here; the gate just counts.
#[derive(Clone)]
pub struct ParallelismGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    increases: Arc<AtomicUsize>,
    decreases: Arc<AtomicUsize>,
}

impl ParallelismGate {
    pub fn new(parallelism: usize) -> Self {
        let capacity = parallelism.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            increases: Arc::new(AtomicUsize::new(0)),
            decreases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a slot, blocking until one is free.
    pub async fn increase(&self) {
        // acquire never errors: the semaphore is never closed
        if let Ok(permit) = self.semaphore.acquire().await {
            permit.forget();
            self.increases.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Return a slot.
    pub fn decrease(&self) {
        self.decreases.fetch_add(1, Ordering::SeqCst);
        self.semaphore.add_permits(1);
    }

    /// Slots currently taken.
    pub fn current_parallelism(&self) -> usize {
        self.capacity.saturating_sub(self.semaphore.available_permits())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lifetime counters, for invariant checks.
    pub fn counters(&self) -> (usize, usize) {
        (self.increases.load(Ordering::SeqCst), self.decreases.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
