//! Cooperative idle scheduling seam. The queue never talks to a real timer
//! facility — hosts supply one ([`InlineScheduler`] for synchronous
//! environments, a `requestIdleCallback` bridge in a browser embedding,
//! [`ManualScheduler`] in tests).

use std::cell::RefCell;
use std::time::Instant;

/// A deferred drain callback.
pub type IdleCallback = Box<dyn FnOnce()>;

/// Host-provided idle callback facility plus a monotonic clock.
///
/// `schedule_idle` must invoke the callback at most once, at some later
/// point when the host has spare cycles. The queue guarantees it never
/// schedules a second callback while one is outstanding.
pub trait Scheduler {
    /// Monotonic milliseconds. Only differences are meaningful.
    fn now(&self) -> u64;

    /// Queue `callback` for the next idle opportunity.
    fn schedule_idle(&self, callback: IdleCallback);
}

/// Runs idle callbacks immediately. Degrades idle batching to synchronous
/// delivery; suitable for hosts without an idle facility.
pub struct InlineScheduler {
    origin: Instant,
}

impl InlineScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InlineScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for InlineScheduler {
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn schedule_idle(&self, callback: IdleCallback) {
        callback();
    }
}

/// Collects idle callbacks and a hand-advanced clock, so tests can
/// deterministically simulate frame-budget exhaustion and deferred drains.
#[derive(Default)]
pub struct ManualScheduler {
    clock: RefCell<u64>,
    pending: RefCell<Vec<IdleCallback>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the fake clock by `ms`.
    pub fn advance(&self, ms: u64) {
        *self.clock.borrow_mut() += ms;
    }

    /// Number of idle opportunities waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fires every pending idle callback once. Callbacks scheduled during
    /// the run are left for the next call, mirroring how a host idle
    /// facility defers re-scheduled work to a later tick.
    pub fn run_idle(&self) {
        let batch: Vec<IdleCallback> = self.pending.borrow_mut().drain(..).collect();
        for callback in batch {
            callback();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> u64 {
        *self.clock.borrow()
    }

    fn schedule_idle(&self, callback: IdleCallback) {
        self.pending.borrow_mut().push(callback);
    }
}
