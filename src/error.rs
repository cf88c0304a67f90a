use core::fmt;

/// Errors reported when building a queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// A construction parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The initial segment could not be allocated.
    #[error("failed to allocate a segment of {0} slots")]
    AllocFailed(usize),
}

/// Error returned by [`Queue::try_enqueue`](crate::Queue::try_enqueue).
///
/// Carries the rejected item so the caller keeps ownership of it.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError<T> {
    /// The slot array for a new segment could not be allocated.
    #[error("failed to allocate a segment of {buffer_size} slots")]
    AllocFailed {
        /// The item that was not enqueued.
        item: T,
        /// Slot count of the segment that could not be allocated.
        buffer_size: usize,
    },
}

impl<T> EnqueueError<T> {
    /// Returns the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            EnqueueError::AllocFailed { item, .. } => item,
        }
    }
}

// Manual impl so `T` does not need to be `Debug`.
impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::AllocFailed { buffer_size, .. } => f
                .debug_struct("AllocFailed")
                .field("buffer_size", buffer_size)
                .finish_non_exhaustive(),
        }
    }
}
