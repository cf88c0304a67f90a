use core::fmt;

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use crossbeam_utils::CachePadded;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::{EnqueueError, QueueError};
use crate::reclaim::{self, Domain};
use crate::segment::Segment;
use crate::sync::{Ordering, Spin};

/// Unbounded lock-free MPMC queue made of fixed-size array segments.
///
/// Producers take a ticket in the tail segment with one fetch-and-add and
/// publish into that slot; consumers take a ticket in the head segment and
/// read it back. When the tail segment runs out of slots a new segment,
/// already holding the producer's item, is linked Michael-Scott style.
///
/// `head` and `tail` live on separate cache lines.
pub struct Queue<T> {
    head: CachePadded<Atomic<Segment<T>>>,
    tail: CachePadded<Atomic<Segment<T>>>,
    buffer_size: usize,
    domain: Domain,
}

impl<T> Queue<T> {
    /// Creates an empty queue whose segments hold `buffer_size` items each.
    ///
    /// Fails with [`QueueError::InvalidArgument`] when `buffer_size` is zero.
    pub fn new(buffer_size: usize) -> Result<Self, QueueError> {
        Self::with_config(Config::new(buffer_size))
    }

    /// Creates an empty queue from a validated [`Config`].
    pub fn with_config(config: Config) -> Result<Self, QueueError> {
        Self::with_domain(config, Domain::new())
    }

    fn with_domain(config: Config, domain: Domain) -> Result<Self, QueueError> {
        config.validate()?;
        let buffer_size = config.buffer_size;
        let sentinel =
            Segment::new(buffer_size).map_err(|_| QueueError::AllocFailed(buffer_size))?;

        // Nothing is shared yet.
        let guard = unsafe { epoch::unprotected() };
        let sentinel = Owned::new(sentinel).into_shared(guard);
        debug!(buffer_size, "created queue");

        Ok(Queue {
            head: CachePadded::new(Atomic::from(sentinel)),
            tail: CachePadded::new(Atomic::from(sentinel)),
            buffer_size,
            domain,
        })
    }

    /// Number of slots in each segment.
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Appends `item` to the back of the queue.
    ///
    /// Lock-free: the uncontended path is one fetch-and-add and one CAS.
    ///
    /// # Panics
    ///
    /// Panics if a new segment is needed and cannot be allocated. Use
    /// [`try_enqueue`](Self::try_enqueue) to get the item back instead.
    pub fn enqueue(&self, item: T) {
        if let Err(err) = self.try_enqueue(item) {
            panic!("{err}");
        }
    }

    /// Appends `item`, returning it inside the error if a new segment cannot
    /// be allocated.
    pub fn try_enqueue(&self, mut item: T) -> Result<(), EnqueueError<T>> {
        let guard = &self.domain.pin();
        loop {
            let ltail = self.tail.load(Ordering::Acquire, guard);
            let tail = unsafe { ltail.deref() };

            let idx = tail.reserve_enqueue();
            if idx < self.buffer_size {
                match unsafe { tail.slot(idx).publish(item) } {
                    Ok(()) => return Ok(()),
                    // A consumer gave up on this index; take a fresh one.
                    Err(back) => {
                        item = back;
                        continue;
                    }
                }
            }

            // The segment is full.
            if ltail != self.tail.load(Ordering::Acquire, guard) {
                continue;
            }
            let lnext = tail.next(guard);
            if !lnext.is_null() {
                self.cas_tail(ltail, lnext, guard);
                continue;
            }

            let segment = match Segment::with_item(self.buffer_size, item) {
                Ok(segment) => segment,
                Err((item, err)) => {
                    warn!(buffer_size = self.buffer_size, error = %err, "segment allocation failed");
                    return Err(EnqueueError::AllocFailed {
                        item,
                        buffer_size: self.buffer_size,
                    });
                }
            };
            match tail.cas_next(Owned::new(segment), guard) {
                Ok(linked) => {
                    trace!(segment = ?linked.as_raw(), "linked overflow segment");
                    self.cas_tail(ltail, linked, guard);
                    return Ok(());
                }
                // Another producer linked first. Nothing else ever saw this
                // segment, so slot 0 still holds the item.
                Err(mut rejected) => match rejected.take_first() {
                    Some(back) => item = back,
                    None => unreachable!("overflow segment lost its pre-filled item"),
                },
            }
        }
    }

    /// Removes the item at the front of the queue, or returns `None` if the
    /// queue currently holds nothing.
    ///
    /// Lock-free. A consumer whose ticket has been claimed by a producer that
    /// has not finished writing waits for that write with exponential backoff.
    pub fn dequeue(&self) -> Option<T> {
        let guard = &self.domain.pin();
        loop {
            let lhead = self.head.load(Ordering::Acquire, guard);
            let head = unsafe { lhead.deref() };

            if head.dequeued() >= head.enqueued() && head.next(guard).is_null() {
                return None;
            }

            let idx = head.reserve_dequeue();
            if idx >= self.buffer_size {
                let lnext = head.next(guard);
                if lnext.is_null() {
                    return None;
                }
                self.advance_head(lhead, lnext, guard);
                continue;
            }

            let slot = head.slot(idx);
            let spin = Spin::new();
            loop {
                if let Some(item) = unsafe { slot.take() } {
                    return Some(item);
                }
                if head.enqueued() <= idx {
                    // No producer holds this index. Close it so a late one
                    // retries elsewhere, then take a new ticket.
                    if slot.close() {
                        break;
                    }
                    continue;
                }
                spin.snooze();
            }
        }
    }

    /// Moves `head` off a drained segment and retires it.
    fn advance_head<'g>(
        &self,
        lhead: Shared<'g, Segment<T>>,
        lnext: Shared<'g, Segment<T>>,
        guard: &'g Guard,
    ) {
        // Keep tail from pointing at a segment that is about to be retired.
        if self.tail.load(Ordering::Acquire, guard) == lhead {
            self.cas_tail(lhead, lnext, guard);
        }
        if self.cas_head(lhead, lnext, guard) {
            unsafe { reclaim::retire(guard, lhead) };
        }
    }

    #[inline]
    fn cas_head<'g>(
        &self,
        current: Shared<'g, Segment<T>>,
        new: Shared<'g, Segment<T>>,
        guard: &'g Guard,
    ) -> bool {
        self.head
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire, guard)
            .is_ok()
    }

    #[inline]
    fn cas_tail<'g>(
        &self,
        current: Shared<'g, Segment<T>>,
        new: Shared<'g, Segment<T>>,
        guard: &'g Guard,
    ) -> bool {
        self.tail
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire, guard)
            .is_ok()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        match Self::with_config(Config::default()) {
            Ok(queue) => queue,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();
            let head = self.head.load(Ordering::Relaxed, guard);
            reclaim::free_chain(head, guard);
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::segment::DROPPED;
    use crossbeam_epoch::Collector;
    use std::sync::Arc;
    use std::thread;

    fn segments<T>(queue: &Queue<T>) -> usize {
        let guard = &queue.domain.pin();
        let mut count = 0;
        let mut current = queue.head.load(Ordering::Acquire, guard);
        while !current.is_null() {
            count += 1;
            current = unsafe { current.deref() }.next(guard);
        }
        count
    }

    fn head_is_tail<T>(queue: &Queue<T>) -> bool {
        let guard = &queue.domain.pin();
        queue.head.load(Ordering::Acquire, guard) == queue.tail.load(Ordering::Acquire, guard)
    }

    #[test]
    fn smoke() {
        let q = Queue::new(8).unwrap();
        q.enqueue(42);
        assert_eq!(q.dequeue(), Some(42));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn overflow_links_new_segments() {
        let q = Queue::new(2).unwrap();
        for i in 1..=5 {
            q.enqueue(i);
        }
        assert_eq!(segments(&q), 3);
        assert!(!head_is_tail(&q));

        for i in 1..=5 {
            assert_eq!(q.dequeue(), Some(i));
        }
        assert_eq!(q.dequeue(), None);
        assert_eq!(segments(&q), 1);
        assert!(head_is_tail(&q));
    }

    #[test]
    fn abandoned_index_is_not_lost() {
        let q = Queue::new(4).unwrap();
        {
            // A consumer that reserved index 0 before any producer did.
            let guard = &q.domain.pin();
            let head = unsafe { q.head.load(Ordering::Acquire, guard).deref() };
            assert_eq!(head.reserve_dequeue(), 0);
            assert!(head.slot(0).close());
        }

        // The producer draws index 0, finds it closed and retries on index 1.
        q.enqueue("late");
        assert_eq!(q.dequeue(), Some("late"));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn drained_segment_helps_tail_forward() {
        let q = Queue::new(1).unwrap();
        q.enqueue(1);
        q.enqueue(2);
        {
            // Simulate a producer that linked but never moved tail.
            let guard = &q.domain.pin();
            let head = q.head.load(Ordering::Acquire, guard);
            q.tail.store(head, Ordering::Release);
        }
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
        assert!(head_is_tail(&q));
    }

    #[test]
    fn drained_segments_are_reclaimed() {
        let dropped = || DROPPED.with(|d| d.get());
        let q = Queue::with_domain(Config::new(2), Domain::Owned(Collector::new())).unwrap();
        let start = dropped();

        for i in 0..8 {
            q.enqueue(i);
        }
        assert_eq!(segments(&q), 4);
        for i in 0..8 {
            assert_eq!(q.dequeue(), Some(i));
        }
        assert_eq!(q.dequeue(), None);
        assert_eq!(segments(&q), 1);

        // Three segments went through advance_head; no guard still covers them.
        for _ in 0..128 {
            q.domain.pin().flush();
        }
        assert_eq!(dropped() - start, 3);

        drop(q);
        assert_eq!(dropped() - start, 4);
    }

    #[test]
    fn racing_producers_keep_every_item() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 500;

        // One slot per segment, so nearly every enqueue races to link.
        let q = Arc::new(Queue::new(1).unwrap());
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let q = q.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        q.enqueue(p * PER_PRODUCER + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen = vec![false; PRODUCERS * PER_PRODUCER];
        while let Some(v) = q.dequeue() {
            assert!(!seen[v], "duplicate {v}");
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn oversized_segment_fails_to_allocate() {
        let size = isize::MAX as usize / 2;
        assert_eq!(Queue::<u64>::new(size).unwrap_err(), QueueError::AllocFailed(size));
    }

    #[test]
    fn rejects_zero_buffer() {
        assert!(matches!(
            Queue::<u8>::new(0),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn queue_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<Queue<String>>();
    }
}
