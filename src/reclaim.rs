//! Epoch-based reclamation of drained segments.
//!
//! Every queue operation runs inside a pinned [`Guard`]. A segment that
//! `head` has moved past is retired through [`retire`] and only freed once
//! every guard that was alive at retirement has been dropped, so a stale
//! `head`/`tail` snapshot held by another thread never dangles.

use crossbeam_epoch::{self as epoch, Collector, Guard, Shared};

use crate::segment::Segment;

/// The collector a queue's retired segments wait in.
pub(crate) enum Domain {
    /// crossbeam-epoch's process-wide collector, pinned through a
    /// thread-local handle.
    Global,
    /// A collector owned by the queue. Its pending garbage is freed when the
    /// queue drops, never later.
    Owned(Collector),
}

impl Domain {
    /// Under loom every queue gets its own collector: a segment freed by the
    /// global one in a later model execution would touch that execution's
    /// dead atomics.
    pub(crate) fn new() -> Self {
        if cfg!(loom) {
            Domain::Owned(Collector::new())
        } else {
            Domain::Global
        }
    }

    /// Pins the current thread for one queue operation.
    #[inline]
    pub(crate) fn pin(&self) -> Guard {
        match self {
            Domain::Global => epoch::pin(),
            // The guard keeps the participant registered after the handle drops.
            Domain::Owned(collector) => collector.register().pin(),
        }
    }
}

/// Schedules a detached segment for destruction.
///
/// # Safety
///
/// `segment` must no longer be reachable from the queue's `head` or `tail`,
/// and must be retired exactly once.
pub(crate) unsafe fn retire<T>(guard: &Guard, segment: Shared<'_, Segment<T>>) {
    tracing::trace!(
        segment = ?segment.as_raw(),
        dequeued = unsafe { segment.deref() }.dequeued(),
        "retiring drained segment"
    );
    unsafe { guard.defer_destroy(segment) };
}

/// Frees every segment from `first` to the end of the chain.
///
/// # Safety
///
/// No other thread may access the chain, which holds when the queue is
/// being dropped.
pub(crate) unsafe fn free_chain<T>(first: Shared<'_, Segment<T>>, guard: &Guard) {
    let mut current = first;
    while !current.is_null() {
        let next = unsafe { current.deref() }.next(guard);
        drop(unsafe { current.into_owned() });
        current = next;
    }
}
