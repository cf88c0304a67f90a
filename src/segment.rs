use core::fmt;
use std::collections::TryReserveError;

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};
use crossbeam_utils::CachePadded;

use crate::slot::Slot;
use crate::sync::{AtomicUsize, Ordering};

/// A fixed-size array of slots in the queue's linked chain.
///
/// `enq_idx` and `deq_idx` are tickets handed out by FAA. Both may run past
/// the end of the slot array; a ticket at or beyond `buffer_size` means the
/// segment is full (for producers) or drained (for consumers).
pub(crate) struct Segment<T> {
    enq_idx: CachePadded<AtomicUsize>,
    deq_idx: CachePadded<AtomicUsize>,
    next: Atomic<Segment<T>>,
    slots: Box<[Slot<T>]>,
}

impl<T> Segment<T> {
    /// An empty segment, used as the initial sentinel.
    pub(crate) fn new(buffer_size: usize) -> Result<Self, TryReserveError> {
        let mut slots = reserve_slots(buffer_size)?;
        slots.resize_with(buffer_size, Slot::new);
        Ok(Segment::from_parts(slots.into_boxed_slice(), 0))
    }

    /// An overflow segment that already holds `item` in slot 0.
    ///
    /// On allocation failure the item is handed back with the error.
    pub(crate) fn with_item(buffer_size: usize, item: T) -> Result<Self, (T, TryReserveError)> {
        let mut slots = match reserve_slots(buffer_size) {
            Ok(slots) => slots,
            Err(err) => return Err((item, err)),
        };
        slots.push(Slot::with_item(item));
        slots.resize_with(buffer_size.max(1), Slot::new);
        Ok(Segment::from_parts(slots.into_boxed_slice(), 1))
    }

    fn from_parts(slots: Box<[Slot<T>]>, enqueued: usize) -> Self {
        Segment {
            enq_idx: CachePadded::new(AtomicUsize::new(enqueued)),
            deq_idx: CachePadded::new(AtomicUsize::new(0)),
            next: Atomic::null(),
            slots,
        }
    }

    #[inline]
    pub(crate) fn buffer_size(&self) -> usize {
        self.slots.len()
    }

    /// Reserves the next producer ticket.
    #[inline]
    pub(crate) fn reserve_enqueue(&self) -> usize {
        self.enq_idx.fetch_add(1, Ordering::AcqRel)
    }

    /// Reserves the next consumer ticket.
    #[inline]
    pub(crate) fn reserve_dequeue(&self) -> usize {
        self.deq_idx.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn enqueued(&self) -> usize {
        self.enq_idx.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn dequeued(&self) -> usize {
        self.deq_idx.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn slot(&self, idx: usize) -> &Slot<T> {
        &self.slots[idx]
    }

    #[inline]
    pub(crate) fn next<'g>(&self, guard: &'g Guard) -> Shared<'g, Segment<T>> {
        self.next.load(Ordering::Acquire, guard)
    }

    /// Links `new` as the successor if none exists yet. Single attempt.
    ///
    /// On failure the caller gets its segment back untouched.
    #[inline]
    pub(crate) fn cas_next<'g>(
        &self,
        new: Owned<Segment<T>>,
        guard: &'g Guard,
    ) -> Result<Shared<'g, Segment<T>>, Owned<Segment<T>>> {
        self.next
            .compare_exchange(
                Shared::null(),
                new,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            )
            .map_err(|err| err.new)
    }

    /// Takes back the pre-filled item of an overflow segment that never got linked.
    pub(crate) fn take_first(&mut self) -> Option<T> {
        self.slots.first_mut().and_then(Slot::unpublish)
    }
}

/// Reserves the slot array up front so an oversized segment fails
/// with an error instead of aborting the process.
fn reserve_slots<T>(buffer_size: usize) -> Result<Vec<Slot<T>>, TryReserveError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(buffer_size)?;
    Ok(slots)
}

#[cfg(all(test, not(loom)))]
thread_local! {
    /// Segments dropped on the current thread.
    pub(crate) static DROPPED: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
}

#[cfg(all(test, not(loom)))]
impl<T> Drop for Segment<T> {
    fn drop(&mut self) {
        DROPPED.with(|dropped| dropped.set(dropped.get() + 1));
    }
}

impl<T> fmt::Debug for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("buffer_size", &self.buffer_size())
            .field("enq_idx", &self.enqueued())
            .field("deq_idx", &self.dequeued())
            .finish_non_exhaustive()
    }
}
