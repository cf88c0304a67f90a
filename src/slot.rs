use core::cell::UnsafeCell;
use core::fmt;
use core::mem::MaybeUninit;

use crate::sync::{AtomicU8, Ordering};

/// State of a single slot.
///
/// Moves `Empty -> Item -> Taken`, or `Empty -> Taken` when a consumer closes
/// an index no producer has filled yet. `Taken` is terminal.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Empty = 0,
    Item = 1,
    Taken = 2,
}

impl SlotState {
    #[inline]
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => SlotState::Empty,
            1 => SlotState::Item,
            _ => SlotState::Taken,
        }
    }
}

/// One cell of a segment: a state tag plus storage for the payload.
///
/// Every index is handed out by FAA to exactly one producer and exactly one
/// consumer, so the payload cell is only ever written by its producer and
/// only read by its consumer. The state tag orders the two.
pub(crate) struct Slot<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Slot {
            state: AtomicU8::new(SlotState::Empty as u8),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// A slot that already holds `item`, used for slot 0 of an overflow segment.
    pub(crate) fn with_item(item: T) -> Self {
        Slot {
            state: AtomicU8::new(SlotState::Item as u8),
            value: UnsafeCell::new(MaybeUninit::new(item)),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Publishes `item`, handing it back if a consumer already closed the slot.
    ///
    /// # Safety
    ///
    /// The caller must be the producer that reserved this slot's index.
    #[inline]
    pub(crate) unsafe fn publish(&self, item: T) -> Result<(), T> {
        unsafe { (*self.value.get()).write(item) };
        match self.state.compare_exchange(
            SlotState::Empty as u8,
            SlotState::Item as u8,
            Ordering::Release,
            Ordering::Relaxed,
        ) {
            Ok(_) => Ok(()),
            Err(_) => Err(unsafe { (*self.value.get()).assume_init_read() }),
        }
    }

    /// Takes the item out if one has been published.
    ///
    /// # Safety
    ///
    /// The caller must be the consumer that reserved this slot's index.
    #[inline]
    pub(crate) unsafe fn take(&self) -> Option<T> {
        if self.state() != SlotState::Item {
            return None;
        }
        let item = unsafe { (*self.value.get()).assume_init_read() };
        self.state.store(SlotState::Taken as u8, Ordering::Release);
        Some(item)
    }

    /// Closes an index that no producer has filled.
    ///
    /// Returns `false` if a producer won the race and the slot now holds an item.
    #[inline]
    pub(crate) fn close(&self) -> bool {
        self.state
            .compare_exchange(
                SlotState::Empty as u8,
                SlotState::Taken as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves a published item back out of a slot nobody else can see.
    pub(crate) fn unpublish(&mut self) -> Option<T> {
        if self.state.load(Ordering::Relaxed) != SlotState::Item as u8 {
            return None;
        }
        self.state.store(SlotState::Empty as u8, Ordering::Relaxed);
        Some(unsafe { self.value.get_mut().assume_init_read() })
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Relaxed) == SlotState::Item as u8 {
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("state", &self.state()).finish()
    }
}
