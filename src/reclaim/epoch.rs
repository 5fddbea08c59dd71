//! Epoch-based reclamation using crossbeam-epoch.
//!
//! `EpochReclaim` pins the global crossbeam collector. A retired node is destroyed only
//! after every thread that was pinned at retirement time has unpinned, which makes it
//! impossible for any in-flight operation to dereference freed memory or to observe a
//! recycled address in a CAS.
//!
//! # Performance
//!
//! - **Pin overhead**: very low (thread-local check)
//! - **Reclamation**: batched, amortized O(1) per node
//! - **Memory**: retired nodes accumulate while any thread stays pinned, for example
//!   while a long-lived [`Snapshot`](crate::queue::Snapshot) is held

use super::{Reclaim, ReclaimCounters, ReclaimStats};
use crossbeam_epoch::{self as epoch, Guard};
use std::sync::Arc;

/// Epoch-based memory reclamation (the default scheme)
#[derive(Debug, Default)]
pub struct EpochReclaim {
    // Shared with deferred destructors, which may run after the owning queue is gone
    counters: Arc<ReclaimCounters>,
}

impl EpochReclaim {
    /// Create a new epoch reclaimer backed by the global collector
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reclaim for EpochReclaim {
    type Guard = Guard;

    #[inline]
    fn pin(&self) -> Guard {
        epoch::pin()
    }

    unsafe fn retire<N>(&self, guard: &Guard, node: *mut N, destroy: unsafe fn(*mut N)) {
        self.counters.record_retired();

        let counters = Arc::clone(&self.counters);
        unsafe {
            guard.defer_unchecked(move || {
                destroy(node);
                counters.record_reclaimed(1);
            });
        }
    }

    fn flush(&self, guard: &Guard) {
        guard.flush();
    }

    fn stats(&self) -> ReclaimStats {
        self.counters.snapshot()
    }
}
