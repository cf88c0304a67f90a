use crate::error::QueueError;

/// Slots per segment used by [`Config::default`].
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Construction parameters for a [`Queue`](crate::Queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots in every segment. Must be greater than zero.
    pub buffer_size: usize,
}

impl Config {
    /// Config with the given segment size.
    pub const fn new(buffer_size: usize) -> Self {
        Config { buffer_size }
    }

    /// Checks the parameters, returning `InvalidArgument` for a zero or absurd segment size.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.buffer_size == 0 {
            return Err(QueueError::InvalidArgument(
                "buffer_size must be greater than 0",
            ));
        }
        // Counters run past the segment end under contention; leave headroom.
        if self.buffer_size > isize::MAX as usize / 2 {
            return Err(QueueError::InvalidArgument("buffer_size is too large"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_BUFFER_SIZE)
    }
}
