//! Performance Metrics Module
//!
//! Lightweight operation counters for the queue. They expose how often operations had to
//! retry or help other threads, which is the main cost of lock-free progress under
//! contention, without adding any synchronization to the hot path beyond relaxed atomic
//! increments.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Snapshot of queue operation metrics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Successful enqueues
    pub enqueues: u64,
    /// Successful dequeues
    pub dequeues: u64,
    /// Dequeues that returned `QueueEmpty`
    pub empty_polls: u64,
    /// Retry-loop iterations caused by a failed CAS or a moved `head`/`tail`
    pub cas_retries: u64,
    /// Times a thread advanced a lagging `tail` on behalf of another enqueue
    pub helps: u64,
    /// Most retries observed by a single operation
    pub max_retries: u64,
}

impl QueueMetrics {
    /// All completed operations, including empty polls
    pub fn total_operations(&self) -> u64 {
        self.enqueues + self.dequeues + self.empty_polls
    }

    /// Average retries per completed operation
    pub fn retries_per_operation(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 {
            0.0
        } else {
            self.cas_retries as f64 / total as f64
        }
    }

    /// Percentage of dequeue attempts that found the queue empty
    pub fn empty_poll_rate(&self) -> f64 {
        let polls = self.dequeues + self.empty_polls;
        if polls == 0 {
            0.0
        } else {
            (self.empty_polls as f64 / polls as f64) * 100.0
        }
    }
}

/// Internal atomic metrics collection
#[derive(Debug)]
pub(crate) struct AtomicMetrics {
    enabled: AtomicBool,
    enqueues: AtomicU64,
    dequeues: AtomicU64,
    empty_polls: AtomicU64,
    cas_retries: AtomicU64,
    helps: AtomicU64,
    max_retries: AtomicU64,
}

impl AtomicMetrics {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            enqueues: AtomicU64::new(0),
            dequeues: AtomicU64::new(0),
            empty_polls: AtomicU64::new(0),
            cas_retries: AtomicU64::new(0),
            helps: AtomicU64::new(0),
            max_retries: AtomicU64::new(0),
        }
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record a completed enqueue and the retries it needed
    #[inline]
    pub(crate) fn record_enqueue(&self, retries: u64) {
        if self.enabled() {
            self.enqueues.fetch_add(1, Ordering::Relaxed);
            self.record_retries(retries);
        }
    }

    /// Record a dequeue that returned a value
    #[inline]
    pub(crate) fn record_dequeue(&self, retries: u64) {
        if self.enabled() {
            self.dequeues.fetch_add(1, Ordering::Relaxed);
            self.record_retries(retries);
        }
    }

    /// Record a dequeue that found the queue empty
    #[inline]
    pub(crate) fn record_empty(&self, retries: u64) {
        if self.enabled() {
            self.empty_polls.fetch_add(1, Ordering::Relaxed);
            self.record_retries(retries);
        }
    }

    /// Record a successful tail advance on behalf of another thread
    #[inline]
    pub(crate) fn record_help(&self) {
        if self.enabled() {
            self.helps.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_retries(&self, retries: u64) {
        if retries == 0 {
            return;
        }
        self.cas_retries.fetch_add(retries, Ordering::Relaxed);

        let mut current_max = self.max_retries.load(Ordering::Relaxed);
        while retries > current_max {
            match self.max_retries.compare_exchange_weak(
                current_max,
                retries,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => current_max = x,
            }
        }
    }

    pub(crate) fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            enqueues: self.enqueues.load(Ordering::Relaxed),
            dequeues: self.dequeues.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
            helps: self.helps.load(Ordering::Relaxed),
            max_retries: self.max_retries.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.enqueues.store(0, Ordering::Relaxed);
        self.dequeues.store(0, Ordering::Relaxed);
        self.empty_polls.store(0, Ordering::Relaxed);
        self.cas_retries.store(0, Ordering::Relaxed);
        self.helps.store(0, Ordering::Relaxed);
        self.max_retries.store(0, Ordering::Relaxed);
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled()
    }
}

/// Trait for data structures that support performance metrics
pub trait MetricsCollector {
    /// Get current performance metrics
    fn metrics(&self) -> QueueMetrics;

    /// Reset all metrics
    fn reset_metrics(&self);

    /// Enable or disable metrics collection
    fn set_metrics_enabled(&self, enabled: bool);

    /// Check if metrics collection is enabled
    fn is_metrics_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_when_enabled() {
        let metrics = AtomicMetrics::new(true);
        metrics.record_enqueue(0);
        metrics.record_enqueue(3);
        metrics.record_dequeue(1);
        metrics.record_empty(0);
        metrics.record_help();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.enqueues, 2);
        assert_eq!(snapshot.dequeues, 1);
        assert_eq!(snapshot.empty_polls, 1);
        assert_eq!(snapshot.cas_retries, 4);
        assert_eq!(snapshot.helps, 1);
        assert_eq!(snapshot.max_retries, 3);
        assert_eq!(snapshot.total_operations(), 4);
        assert!((snapshot.retries_per_operation() - 1.0).abs() < f64::EPSILON);
        assert!((snapshot.empty_poll_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let metrics = AtomicMetrics::new(false);
        metrics.record_enqueue(5);
        metrics.record_help();
        assert_eq!(metrics.snapshot(), QueueMetrics::default());

        metrics.set_enabled(true);
        assert!(metrics.is_enabled());
        metrics.record_enqueue(0);
        assert_eq!(metrics.snapshot().enqueues, 1);
    }

    #[test]
    fn test_reset() {
        let metrics = AtomicMetrics::new(true);
        metrics.record_dequeue(9);
        metrics.reset();
        assert_eq!(metrics.snapshot(), QueueMetrics::default());
    }

    #[test]
    fn test_rates_on_empty_snapshot() {
        let snapshot = QueueMetrics::default();
        assert_eq!(snapshot.retries_per_operation(), 0.0);
        assert_eq!(snapshot.empty_poll_rate(), 0.0);
    }
}
