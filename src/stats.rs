// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! Lock-free counters shared across every worker, sampled by an optional
//! reporting thread without locks (mirroring `workunit_store`'s use of
//! plain atomics for state a reader may observe mid-flight).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Monotonically increasing search counters. Every field is updated with
/// `Ordering::Relaxed`: callers only need eventual consistency, never a
/// synchronisation point with another field.
#[derive(Default)]
pub struct Stats {
    count_now: AtomicU64,
    count_last: AtomicU64,
    total_pending_now: AtomicU64,
    total_pending_last: AtomicU64,
    max_pending: AtomicUsize,
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }

    pub fn count_now(&self) -> u64 {
        self.count_now.load(Ordering::Relaxed)
    }

    pub fn count_last(&self) -> u64 {
        self.count_last.load(Ordering::Relaxed)
    }

    pub fn total_pending_now(&self) -> u64 {
        self.total_pending_now.load(Ordering::Relaxed)
    }

    pub fn total_pending_last(&self) -> u64 {
        self.total_pending_last.load(Ordering::Relaxed)
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending.load(Ordering::Relaxed)
    }

    /// Called once per completed, valid candidate graph.
    pub fn record_completion(&self) {
        self.count_now.fetch_add(1, Ordering::Relaxed);
    }

    /// Called once per `PendingDef` pushed onto any worker's stack.
    pub fn record_pushed(&self, count: u64) {
        self.total_pending_now.fetch_add(count, Ordering::Relaxed);
    }

    /// Called by a worker holding its stack's mutex, with the stack's
    /// current size, so `max_pending` tracks the largest live stack seen
    /// across every worker without itself needing a lock.
    pub fn record_stack_size(&self, len: usize) {
        self.max_pending.fetch_max(len, Ordering::Relaxed);
    }

    /// Snapshots `count_now`/`total_pending_now` into `count_last`/
    /// `total_pending_last`, for a reporting thread computing a rate between
    /// two samples.
    pub fn tick(&self) {
        self.count_last
            .store(self.count_now(), Ordering::Relaxed);
        self.total_pending_last
            .store(self.total_pending_now(), Ordering::Relaxed);
    }
}
