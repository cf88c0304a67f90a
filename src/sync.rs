//! Atomics used by slots and segment counters.
//!
//! Under `--cfg loom` these resolve to loom's model-checked types so the slot
//! protocol can be explored exhaustively by `tests/loom_tests.rs`.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU8, AtomicUsize};

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicU8, AtomicUsize};

pub(crate) use core::sync::atomic::Ordering;

/// Spin helper for the consumer waiting on an in-flight producer.
pub(crate) struct Spin {
    #[cfg(not(loom))]
    backoff: crossbeam_utils::Backoff,
}

impl Spin {
    #[inline]
    pub(crate) fn new() -> Self {
        Spin {
            #[cfg(not(loom))]
            backoff: crossbeam_utils::Backoff::new(),
        }
    }

    /// Bounded exponential backoff, then yield to the scheduler.
    #[inline]
    pub(crate) fn snooze(&self) {
        #[cfg(not(loom))]
        self.backoff.snooze();
        #[cfg(loom)]
        loom::thread::yield_now();
    }
}
