//! # msqueue
//!
//! A lock-free, multi-producer multi-consumer FIFO queue built on the Michael & Scott
//! non-blocking algorithm, with an explicit safe-memory-reclamation subsystem.
//!
//! ## Features
//!
//! - **Unbounded MPMC queue**: any number of threads may enqueue and dequeue concurrently
//! - **Lock-free progress**: no operation ever waits on a lock held by another thread
//! - **Pluggable reclamation**: epoch-based reclamation by default, a deferred scheme for tests
//! - **Advisory introspection**: approximate size, non-empty hint and best-effort snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use msqueue::{Error, MsQueue};
//!
//! let queue = MsQueue::new();
//! queue.enqueue(42);
//! assert_eq!(queue.dequeue(), Ok(42));
//! assert_eq!(queue.dequeue(), Err(Error::QueueEmpty));
//! ```
//!
//! ## Thread Safety
//!
//! `MsQueue<T>` is `Send + Sync` whenever `T: Send`, so it can be shared across threads
//! behind an `Arc` without additional synchronization.
//!
//! ## Emptiness
//!
//! [`MsQueue::approximate_size`] and [`MsQueue::approximate_non_empty`] are advisory. A
//! check followed by a dequeue always races with other consumers; handle
//! [`Error::QueueEmpty`] instead.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod atomic;
pub mod config;
pub mod metrics;
pub mod queue;
pub mod reclaim;

pub use crate::config::QueueConfig;
pub use crate::metrics::{MetricsCollector, QueueMetrics};
pub use crate::queue::{MsQueue, Snapshot};
pub use crate::reclaim::{DeferredReclaim, EpochReclaim, Reclaim, ReclaimStats};

/// Common utilities and helper types
pub mod util {
    use core::sync::atomic::{AtomicIsize, Ordering};

    /// Cache line size for alignment purposes
    pub const CACHE_LINE_SIZE: usize = 64;

    /// Align a value to cache line boundaries
    #[inline]
    pub const fn align_to_cache_line(size: usize) -> usize {
        (size + CACHE_LINE_SIZE - 1) & !(CACHE_LINE_SIZE - 1)
    }

    /// Pads and aligns a value to the cache line size
    ///
    /// `head` and `tail` of a queue are written by different sets of threads; keeping them
    /// on separate cache lines avoids false sharing between producers and consumers.
    #[repr(align(64))]
    pub struct CachePadded<T> {
        value: T,
    }

    impl<T> CachePadded<T> {
        /// Create a new cache-padded value
        #[inline]
        pub const fn new(value: T) -> Self {
            Self { value }
        }

        /// Get a reference to the inner value
        #[inline]
        pub const fn get(&self) -> &T {
            &self.value
        }

        /// Get a mutable reference to the inner value
        #[inline]
        pub fn get_mut(&mut self) -> &mut T {
            &mut self.value
        }

        /// Get the inner value
        #[inline]
        pub fn into_inner(self) -> T {
            self.value
        }
    }

    impl CachePadded<AtomicIsize> {
        #[inline]
        pub(crate) fn load(&self, order: Ordering) -> isize {
            self.value.load(order)
        }

        #[inline]
        pub(crate) fn fetch_add(&self, val: isize, order: Ordering) -> isize {
            self.value.fetch_add(val, order)
        }

        #[inline]
        pub(crate) fn fetch_sub(&self, val: isize, order: Ordering) -> isize {
            self.value.fetch_sub(val, order)
        }
    }

    impl<T: Default> Default for CachePadded<T> {
        fn default() -> Self {
            Self::new(T::default())
        }
    }

    impl<T: core::fmt::Debug> core::fmt::Debug for CachePadded<T> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&self.value, f)
        }
    }
}

/// Error type for queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// `dequeue` found no value after helping any in-flight enqueue
    QueueEmpty,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::QueueEmpty => write!(f, "Queue is empty"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for queue operations
pub type Result<T> = core::result::Result<T, Error>;
