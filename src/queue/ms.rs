//! Michael-Scott lock-free queue
//!
//! ## Algorithm
//!
//! The queue is a singly-linked list that always starts with a **dummy** node:
//!
//! ```text
//!  head                              tail
//!   │                                 │
//!   ▼                                 ▼
//! [dummy] ──► [a] ──► [b] ──► [c] ──► null
//! ```
//!
//! - `enqueue` links a new node after the last node with a CAS on its `next` link, then
//!   tries to swing `tail` forward. Only the link CAS has to succeed; `tail` may lag one
//!   node behind until any thread advances it.
//! - `dequeue` swings `head` from the dummy to its successor. The successor becomes the new
//!   dummy, its value is moved out, and the old dummy is retired to the reclaimer.
//! - A thread that finds `tail` lagging advances it before retrying its own operation
//!   ("helping"). A dequeue never reports `QueueEmpty` while a node is linked behind a
//!   lagging `tail`.
//!
//! ## Memory Ordering
//!
//! - Link loads use `Acquire`, successful CASes use `AcqRel`
//! - Enqueue order is the order in which link CASes succeed
//! - Dequeue order is the order in which head CASes succeed
//!
//! ## ABA Problem Prevention
//!
//! Every operation pins the queue's [`Reclaim`] scheme before loading any node pointer.
//! A retired node is not freed while any thread pinned before its retirement is still
//! pinned, so a pointer compared by a CAS can never refer to a recycled allocation.

use super::node::Node;
use super::snapshot::Snapshot;
use crate::atomic::{ApproxCounter, Link};
use crate::config::QueueConfig;
use crate::metrics::{AtomicMetrics, MetricsCollector, QueueMetrics};
use crate::reclaim::{EpochReclaim, Reclaim, ReclaimStats};
use crate::util::CachePadded;
use crate::{Error, Result};
use core::fmt;
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};
use crossbeam_utils::Backoff;
use tracing::{debug, trace};

/// A lock-free, unbounded, multi-producer multi-consumer FIFO queue
///
/// `R` selects the memory reclamation scheme; the default [`EpochReclaim`] is suitable for
/// long-running use.
///
/// # Performance Characteristics
///
/// - **Enqueue**: O(1) amortized, one allocation per value
/// - **Dequeue**: O(1) amortized, one retired node per value
/// - **Size**: O(1) approximation
///
/// # Examples
///
/// ```rust
/// use msqueue::MsQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(MsQueue::new());
///
/// let producer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         for i in 0..1000 {
///             queue.enqueue(i);
///         }
///     }
/// });
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut sum = 0;
///         let mut received = 0;
///         while received < 1000 {
///             if let Ok(value) = queue.dequeue() {
///                 sum += value;
///                 received += 1;
///             }
///         }
///         sum
///     }
/// });
///
/// producer.join().unwrap();
/// assert_eq!(consumer.join().unwrap(), 499500);
/// ```
pub struct MsQueue<T, R: Reclaim = EpochReclaim> {
    /// Always points at the dummy node
    head: CachePadded<Link<Node<T>>>,

    /// Last node, or transiently the one before it
    tail: CachePadded<Link<Node<T>>>,

    count: ApproxCounter,

    reclaim: R,

    metrics: AtomicMetrics,

    config: QueueConfig,

    /// Successful dequeues, drives periodic reclamation flushes
    dequeue_ticks: CachePadded<AtomicUsize>,

    _marker: PhantomData<T>,
}

// Values are moved between threads, never shared by reference
unsafe impl<T: Send, R: Reclaim> Send for MsQueue<T, R> {}
unsafe impl<T: Send, R: Reclaim> Sync for MsQueue<T, R> {}

impl<T> MsQueue<T> {
    /// Create an empty queue with epoch-based reclamation
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msqueue::MsQueue;
    ///
    /// let queue: MsQueue<i32> = MsQueue::new();
    /// assert!(!queue.approximate_non_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create an empty queue with epoch-based reclamation and custom settings
    pub fn with_config(config: QueueConfig) -> Self {
        Self::with_reclaim_and_config(EpochReclaim::new(), config)
    }
}

impl<T, R: Reclaim> MsQueue<T, R> {
    /// Create an empty queue using the given reclamation scheme
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msqueue::{DeferredReclaim, MsQueue};
    ///
    /// let queue = MsQueue::with_reclaim(DeferredReclaim::new());
    /// queue.enqueue("hello");
    /// assert_eq!(queue.dequeue(), Ok("hello"));
    /// ```
    pub fn with_reclaim(reclaim: R) -> Self {
        Self::with_reclaim_and_config(reclaim, QueueConfig::default())
    }

    /// Create an empty queue with an explicit reclamation scheme and settings
    pub fn with_reclaim_and_config(reclaim: R, config: QueueConfig) -> Self {
        // Shared by head and tail until the first enqueue
        let dummy = Node::sentinel();

        Self {
            head: CachePadded::new(Link::new(dummy)),
            tail: CachePadded::new(Link::new(dummy)),
            count: ApproxCounter::new(),
            reclaim,
            metrics: AtomicMetrics::new(config.metrics_enabled()),
            config,
            dequeue_ticks: CachePadded::new(AtomicUsize::new(0)),
            _marker: PhantomData,
        }
    }

    /// Append `value` at the tail of the queue
    ///
    /// Never fails and never blocks; under contention the call retries until its node is
    /// linked.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msqueue::MsQueue;
    ///
    /// let queue = MsQueue::new();
    /// queue.enqueue(1);
    /// queue.enqueue(2);
    /// assert_eq!(queue.approximate_size(), 2);
    /// ```
    pub fn enqueue(&self, value: T) {
        // Fully initialized before any CAS can publish it
        let node = Node::new(value);

        let _guard = self.reclaim.pin();
        let backoff = Backoff::new();
        let mut retries = 0u64;

        let tail = loop {
            let tail = self.tail.get().load();
            // SAFETY: `tail` is never null and the guard keeps it allocated
            let next = unsafe { (*tail).next.load() };

            if tail != self.tail.get().load() {
                retries += 1;
                continue;
            }

            if !next.is_null() {
                self.help_advance_tail(tail, next);
                retries += 1;
                continue;
            }

            // SAFETY: as above
            if unsafe { (*tail).next.cas(ptr::null_mut(), node) } {
                break tail;
            }

            retries += 1;
            backoff.spin();
        };

        // Failure means another thread already moved `tail` past our node
        let _ = self.tail.get().cas(tail, node);

        self.count.increment();
        self.metrics.record_enqueue(retries);
    }

    /// Remove and return the oldest value
    ///
    /// Returns [`Error::QueueEmpty`] when no value is linked after the dummy node. An
    /// enqueue that has linked its node but not yet advanced `tail` is helped to completion
    /// first, so its value is never reported missing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msqueue::{Error, MsQueue};
    ///
    /// let queue = MsQueue::new();
    /// queue.enqueue('a');
    /// assert_eq!(queue.dequeue(), Ok('a'));
    /// assert_eq!(queue.dequeue(), Err(Error::QueueEmpty));
    /// ```
    pub fn dequeue(&self) -> Result<T> {
        let guard = self.reclaim.pin();
        let backoff = Backoff::new();
        let mut retries = 0u64;

        loop {
            let head = self.head.get().load();
            let tail = self.tail.get().load();
            // SAFETY: `head` is never null and the guard keeps it allocated
            let next = unsafe { (*head).next.load() };

            if head != self.head.get().load() {
                retries += 1;
                continue;
            }

            if head == tail {
                if next.is_null() {
                    self.metrics.record_empty(retries);
                    return Err(Error::QueueEmpty);
                }

                self.help_advance_tail(tail, next);
                retries += 1;
                continue;
            }

            // `tail` is on the chain and differs from `head`, so `head` has a successor
            debug_assert!(!next.is_null());

            if self.head.get().cas(head, next) {
                // SAFETY: winning the head CAS makes this thread the only taker of the value
                let value = unsafe { Node::take_value(next) };
                self.count.decrement();

                // SAFETY: `head` is now unreachable and only the CAS winner retires it
                unsafe { self.reclaim.retire(&guard, head, Node::<T>::destroy) };

                self.metrics.record_dequeue(retries);
                self.maybe_flush(&guard);
                return Ok(value);
            }

            retries += 1;
            backoff.spin();
        }
    }

    /// Enqueue every value from `values` in iteration order
    ///
    /// Values from one call are not enqueued atomically; other producers may interleave.
    ///
    /// # Returns
    ///
    /// The number of values enqueued
    pub fn enqueue_all<I>(&self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut enqueued = 0;
        for value in values {
            self.enqueue(value);
            enqueued += 1;
        }
        enqueued
    }

    /// Approximate number of values in the queue
    ///
    /// Exact once no operation is in flight. Under concurrency it is advisory only: a
    /// non-zero result does not mean a following [`dequeue`](Self::dequeue) will succeed.
    #[inline]
    pub fn approximate_size(&self) -> usize {
        self.count.get()
    }

    /// Whether the queue appeared non-empty at the time of the call
    ///
    /// Same caveats as [`approximate_size`](Self::approximate_size); handle
    /// [`Error::QueueEmpty`] rather than testing this first.
    #[inline]
    pub fn approximate_non_empty(&self) -> bool {
        self.approximate_size() != 0
    }

    /// Counts of retired and reclaimed nodes
    pub fn reclaim_stats(&self) -> ReclaimStats {
        self.reclaim.stats()
    }

    /// Ask the reclamation scheme to destroy retired nodes that are no longer referenced
    pub fn flush(&self) {
        let guard = self.reclaim.pin();
        self.reclaim.flush(&guard);
        debug!(stats = ?self.reclaim.stats(), "flushed queue reclamation state");
    }

    /// Settings the queue was built with
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn help_advance_tail(&self, tail: *mut Node<T>, next: *mut Node<T>) {
        if self.tail.get().cas(tail, next) {
            trace!("advanced lagging tail for an in-flight enqueue");
            self.metrics.record_help();
        }
    }

    fn maybe_flush(&self, guard: &R::Guard) {
        let interval = self.config.flush_interval();
        if interval == 0 {
            return;
        }

        let ticks = self.dequeue_ticks.get().fetch_add(1, Ordering::Relaxed) + 1;
        if ticks % interval == 0 {
            self.reclaim.flush(guard);
        }
    }
}

impl<T: Copy + Sync, R: Reclaim> MsQueue<T, R> {
    /// Best-effort, forward-only view of the queue's values
    ///
    /// The iterator starts after the dummy node current at call time and follows `next`
    /// links lazily, so values enqueued during iteration are visited too. It ends at a node
    /// whose `next` is empty when reached; with producers outpacing the consumer of the
    /// iterator it may never end. Values dequeued by other threads after the iterator
    /// passed their position still appear. The iterator keeps the calling thread pinned
    /// until it is dropped, delaying reclamation of every node retired in the meantime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msqueue::MsQueue;
    ///
    /// let queue = MsQueue::new();
    /// queue.enqueue_all([1, 2, 3]);
    /// let seen: Vec<i32> = queue.snapshot().collect();
    /// assert_eq!(seen, vec![1, 2, 3]);
    /// ```
    pub fn snapshot(&self) -> Snapshot<'_, T, R> {
        let guard = self.reclaim.pin();
        let dummy = self.head.get().load();
        // SAFETY: `dummy` was loaded under `guard`, which the snapshot keeps alive
        unsafe { Snapshot::new(guard, dummy) }
    }
}

impl<T, R: Reclaim> MetricsCollector for MsQueue<T, R> {
    fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics.set_enabled(enabled);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics.is_enabled()
    }
}

impl<T, R: Reclaim> Drop for MsQueue<T, R> {
    fn drop(&mut self) {
        let dummy = self.head.get_mut().load_mut();

        // SAFETY: `&mut self` proves no other thread can reach any node
        let mut node = unsafe { (*dummy).next.load_mut() };
        unsafe { Node::destroy(dummy) };

        let mut dropped = 0usize;
        while !node.is_null() {
            let next = unsafe { (*node).next.load_mut() };
            unsafe { Node::destroy_with_value(node) };
            node = next;
            dropped += 1;
        }

        if dropped > 0 {
            debug!(dropped, "dropped queue with values still enqueued");
        }
    }
}

impl<T, R: Reclaim> Default for MsQueue<T, R> {
    fn default() -> Self {
        Self::with_reclaim(R::default())
    }
}

impl<T, R: Reclaim> fmt::Debug for MsQueue<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsQueue")
            .field("approximate_size", &self.approximate_size())
            .field("reclaim", &self.reclaim_stats())
            .field("config", &self.config)
            .finish()
    }
}

impl<T, R: Reclaim> Extend<T> for MsQueue<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.enqueue_all(iter);
    }
}

impl<T, R: Reclaim> FromIterator<T> for MsQueue<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let queue = Self::default();
        queue.enqueue_all(iter);
        queue
    }
}

/// Owning iterator that drains a queue in FIFO order
#[derive(Debug)]
pub struct IntoIter<T, R: Reclaim = EpochReclaim> {
    queue: MsQueue<T, R>,
}

impl<T, R: Reclaim> Iterator for IntoIter<T, R> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.dequeue().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Exclusive ownership makes the counter exact
        let len = self.queue.approximate_size();
        (len, Some(len))
    }
}

impl<T, R: Reclaim> ExactSizeIterator for IntoIter<T, R> {}

impl<T, R: Reclaim> IntoIterator for MsQueue<T, R> {
    type Item = T;
    type IntoIter = IntoIter<T, R>;

    fn into_iter(self) -> IntoIter<T, R> {
        IntoIter { queue: self }
    }
}
