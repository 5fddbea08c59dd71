//! Atomic link primitives
//!
//! The queue protocol only ever mutates shared state through two kinds of atomic cell:
//!
//! - [`Link`]: a nullable node pointer updated by compare-and-swap (`head`, `tail` and
//!   every node's `next`)
//! - [`ApproxCounter`]: a signed element counter updated by atomic increment/decrement
//!
//! ## Memory Ordering
//!
//! ```text
//! Producer                              Consumer
//! --------                              --------
//! write node fields                     load link      (Acquire)
//! CAS link: null -> node (Release) ---> read node fields
//! ```
//!
//! A successful CAS uses `AcqRel` so that a node published by one thread is fully
//! initialized when another thread observes it, and so that a thread helping an
//! operation sees everything the helped thread wrote before linking.

use crate::util::CachePadded;
use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicIsize, AtomicPtr, Ordering};

/// An atomically updatable, nullable link to a node
///
/// Loads never dereference the pointer. Dereferencing a loaded pointer is only sound while
/// the reclamation guard that was active during the load is still alive.
pub struct Link<N> {
    ptr: AtomicPtr<N>,
}

impl<N> Link<N> {
    /// Create an empty link
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Create a link that already points at `node`
    #[inline]
    pub const fn new(node: *mut N) -> Self {
        Self {
            ptr: AtomicPtr::new(node),
        }
    }

    /// Load the current target with `Acquire` ordering
    #[inline]
    pub fn load(&self) -> *mut N {
        self.ptr.load(Ordering::Acquire)
    }

    /// Returns `true` if the link currently has no target
    #[inline]
    pub fn is_null(&self) -> bool {
        self.load().is_null()
    }

    /// Compare-and-swap the target from `current` to `new`
    ///
    /// Returns `true` if this call performed the swap. A `false` result means another
    /// thread changed the link first; the caller decides whether that warrants a retry.
    #[inline]
    pub fn cas(&self, current: *mut N, new: *mut N) -> bool {
        self.ptr
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Read the target through exclusive access
    #[inline]
    pub fn load_mut(&mut self) -> *mut N {
        *self.ptr.get_mut()
    }
}

impl<N> Default for Link<N> {
    fn default() -> Self {
        Self::null()
    }
}

impl<N> fmt::Debug for Link<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Link").field(&self.load()).finish()
    }
}

/// An approximate element counter
///
/// A dequeue can complete, and decrement, before the enqueue that linked the same value
/// has incremented, so the raw value may dip below zero momentarily. Reads clamp at zero;
/// once all in-flight operations finish the counter equals the true length.
pub struct ApproxCounter {
    value: CachePadded<AtomicIsize>,
}

impl ApproxCounter {
    /// Create a counter starting at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            value: CachePadded::new(AtomicIsize::new(0)),
        }
    }

    /// Record one successful enqueue
    #[inline]
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Release);
    }

    /// Record one successful dequeue
    #[inline]
    pub fn decrement(&self) {
        self.value.fetch_sub(1, Ordering::Release);
    }

    /// Current value, clamped at zero
    #[inline]
    pub fn get(&self) -> usize {
        let raw = self.value.load(Ordering::Acquire);
        if raw < 0 {
            0
        } else {
            raw as usize
        }
    }
}

impl Default for ApproxCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApproxCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApproxCounter").field(&self.get()).finish()
    }
}
