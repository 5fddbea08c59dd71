//! Deferred reclamation for testing.
//!
//! `DeferredReclaim` never destroys a retired node while the reclaimer is alive. Retired
//! nodes are pushed onto a lock-free singly-linked list and destroyed together when the
//! reclaimer is dropped, which for a queue means when the queue itself is dropped.
//!
//! This gives fully predictable destruction timing and a cheap way to detect reclamation
//! bugs: in debug builds, retiring the same node twice panics on drop instead of causing a
//! double free. Memory grows with the number of dequeues, so it is not meant for
//! long-running production queues.

use super::{Reclaim, ReclaimCounters, ReclaimStats};
use core::fmt;
use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

struct Retired {
    node: *mut (),
    destroy: unsafe fn(*mut ()),
    next: *mut Retired,
}

/// Reclaimer that defers every destruction until it is dropped
pub struct DeferredReclaim {
    retired: AtomicPtr<Retired>,
    counters: ReclaimCounters,
}

// Retired nodes are only touched again with exclusive access in `Drop`
unsafe impl Send for DeferredReclaim {}
unsafe impl Sync for DeferredReclaim {}

impl DeferredReclaim {
    /// Create an empty deferred reclaimer
    pub fn new() -> Self {
        Self {
            retired: AtomicPtr::new(ptr::null_mut()),
            counters: ReclaimCounters::default(),
        }
    }

    fn push(&self, entry: *mut Retired) {
        loop {
            let head = self.retired.load(Ordering::Relaxed);
            unsafe { (*entry).next = head };

            if self
                .retired
                .compare_exchange_weak(head, entry, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Destroy every retired node
    ///
    /// Requires exclusive access, which proves no guard of this reclaimer is alive.
    pub fn reclaim_all(&mut self) {
        let mut entry = mem::replace(self.retired.get_mut(), ptr::null_mut());

        #[cfg(debug_assertions)]
        check_duplicates(entry);

        let mut reclaimed = 0;
        while !entry.is_null() {
            let boxed = unsafe { Box::from_raw(entry) };
            entry = boxed.next;
            unsafe { (boxed.destroy)(boxed.node) };
            reclaimed += 1;
        }

        if reclaimed > 0 {
            self.counters.record_reclaimed(reclaimed);
        }
    }
}

#[cfg(debug_assertions)]
fn check_duplicates(mut entry: *mut Retired) {
    use std::collections::HashSet;

    let mut seen = HashSet::new();
    while !entry.is_null() {
        let current = unsafe { &*entry };
        if !seen.insert(current.node as usize) {
            panic!("node {:p} was retired more than once", current.node);
        }
        entry = current.next;
    }
}

impl Reclaim for DeferredReclaim {
    /// Nothing is freed while the reclaimer lives, so pinning is a no-op
    type Guard = ();

    #[inline]
    fn pin(&self) -> Self::Guard {}

    unsafe fn retire<N>(&self, _guard: &Self::Guard, node: *mut N, destroy: unsafe fn(*mut N)) {
        let entry = Box::into_raw(Box::new(Retired {
            node: node.cast(),
            destroy: unsafe { mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(destroy) },
            next: ptr::null_mut(),
        }));
        self.push(entry);
        self.counters.record_retired();
    }

    fn stats(&self) -> ReclaimStats {
        self.counters.snapshot()
    }
}

impl Default for DeferredReclaim {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredReclaim {
    fn drop(&mut self) {
        self.reclaim_all();
    }
}

impl fmt::Debug for DeferredReclaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredReclaim")
            .field("stats", &self.stats())
            .finish()
    }
}
