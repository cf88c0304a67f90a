//! faa_mpmc - Lock-free unbounded MPMC queue built from fetch-and-add array segments
//!
//! The queue is a Michael-Scott linked list whose nodes are fixed-size arrays.
//! Producers and consumers each claim slots with a single fetch-and-add on the
//! current tail or head segment, so the common case costs one FAA plus one
//! CAS per operation. Drained segments are reclaimed with epoch-based
//! reclamation (`crossbeam-epoch`).
//!
//! ```
//! use faa_mpmc::Queue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(Queue::new(64).unwrap());
//!
//! let producers: Vec<_> = (0..4)
//!     .map(|p| {
//!         let q = queue.clone();
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 q.enqueue(p * 1000 + i);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in producers {
//!     h.join().unwrap();
//! }
//!
//! let mut count = 0;
//! while queue.dequeue().is_some() {
//!     count += 1;
//! }
//! assert_eq!(count, 400);
//! ```
#![warn(missing_docs)]

mod config;
mod error;
mod queue;
mod reclaim;
mod segment;
mod slot;
mod sync;

pub use config::{Config, DEFAULT_BUFFER_SIZE};
pub use error::{EnqueueError, QueueError};
pub use queue::Queue;
