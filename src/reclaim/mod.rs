//! Safe memory reclamation
//!
//! A node unlinked by a successful dequeue may still be read by any thread that loaded a
//! pointer to it before the unlinking CAS. Freeing it immediately would allow a
//! use-after-free, and reusing its address would let a stale CAS succeed (the ABA problem).
//! The [`Reclaim`] trait abstracts over schemes that defer destruction until no thread can
//! still hold such a pointer:
//!
//! ```text
//! MsQueue<T, R: Reclaim>
//!     │
//!     ├── MsQueue<T, EpochReclaim>     (default, crossbeam-epoch)
//!     └── MsQueue<T, DeferredReclaim>  (frees everything on drop, duplicate-retire checks)
//! ```
//!
//! The contract has no queue-specific logic: any structure that unlinks nodes under a
//! pinned guard and hands them to [`Reclaim::retire`] can use it.

mod deferred;
mod epoch;

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

pub use deferred::DeferredReclaim;
pub use epoch::EpochReclaim;

/// A memory reclamation scheme
///
/// # Safety Contract
///
/// Implementations must ensure:
/// 1. A node passed to [`retire`](Reclaim::retire) is not destroyed while any guard that
///    was pinned before the call is still alive
/// 2. Every retired node is destroyed at most once
pub trait Reclaim: Default + Send + Sync {
    /// Protection token held for the duration of a structure access
    ///
    /// Every node pointer loaded while the guard is alive stays dereferenceable until the
    /// guard is dropped.
    type Guard;

    /// Mark the current thread as accessing shared nodes
    fn pin(&self) -> Self::Guard;

    /// Defer destruction of `node` until no pinned thread can reference it
    ///
    /// # Safety
    ///
    /// - `node` must no longer be reachable from the structure's shared links
    /// - `node` must not have been retired before
    /// - `destroy` must be the correct destructor for `node`
    unsafe fn retire<N>(&self, guard: &Self::Guard, node: *mut N, destroy: unsafe fn(*mut N));

    /// Hint that the caller is at a quiescent point and retired nodes may be reclaimed
    fn flush(&self, _guard: &Self::Guard) {}

    /// Counts of retired and reclaimed nodes
    fn stats(&self) -> ReclaimStats;
}

/// Snapshot of reclamation activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimStats {
    /// Nodes handed to `retire`
    pub retired: usize,
    /// Retired nodes whose destructor has run
    pub reclaimed: usize,
}

impl ReclaimStats {
    /// Retired nodes still waiting to be destroyed
    pub fn pending(&self) -> usize {
        self.retired.saturating_sub(self.reclaimed)
    }
}

/// Shared retire/reclaim counters
#[derive(Default)]
pub(crate) struct ReclaimCounters {
    retired: AtomicUsize,
    reclaimed: AtomicUsize,
}

impl ReclaimCounters {
    #[inline]
    pub(crate) fn record_retired(&self) {
        self.retired.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reclaimed(&self, count: usize) {
        self.reclaimed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ReclaimStats {
        // Reclaimed first so a concurrent retire can only make `pending` look larger
        let reclaimed = self.reclaimed.load(Ordering::Relaxed);
        let retired = self.retired.load(Ordering::Relaxed);
        ReclaimStats { retired, reclaimed }
    }
}

impl fmt::Debug for ReclaimCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.snapshot(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending() {
        let stats = ReclaimStats {
            retired: 10,
            reclaimed: 4,
        };
        assert_eq!(stats.pending(), 6);
        assert_eq!(ReclaimStats::default().pending(), 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = ReclaimCounters::default();
        counters.record_retired();
        counters.record_retired();
        counters.record_reclaimed(1);

        let stats = counters.snapshot();
        assert_eq!(stats.retired, 2);
        assert_eq!(stats.reclaimed, 1);
        assert_eq!(stats.pending(), 1);
    }
}
