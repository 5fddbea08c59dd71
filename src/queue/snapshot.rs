//! Best-effort traversal

use super::ms::MsQueue;
use super::node::Node;
use crate::reclaim::Reclaim;
use core::fmt;
use core::marker::PhantomData;

/// Iterator over copies of the values in an [`MsQueue`]
///
/// Created by [`MsQueue::snapshot`]. Holds a reclamation guard for its whole lifetime, so
/// every node it reaches stays allocated even if it is dequeued concurrently.
pub struct Snapshot<'a, T, R: Reclaim> {
    _guard: R::Guard,
    /// Last node visited; its `next` is loaded on the following call
    cursor: *mut Node<T>,
    _queue: PhantomData<&'a MsQueue<T, R>>,
}

impl<'a, T: Copy, R: Reclaim> Snapshot<'a, T, R> {
    /// # Safety
    ///
    /// `dummy` must have been loaded from the queue's `head` while `guard` was alive.
    pub(super) unsafe fn new(guard: R::Guard, dummy: *mut Node<T>) -> Self {
        Self {
            _guard: guard,
            cursor: dummy,
            _queue: PhantomData,
        }
    }
}

impl<T: Copy, R: Reclaim> Iterator for Snapshot<'_, T, R> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        // SAFETY: `cursor` was reached under the held guard
        let next = unsafe { (*self.cursor).next.load() };
        if next.is_null() {
            return None;
        }

        self.cursor = next;
        // SAFETY: every node after the first dummy was built with a value, and `T: Copy`
        // makes a bitwise read sound even if a dequeuer moves the same value out
        Some(unsafe { Node::copy_value(next) })
    }
}

impl<T, R: Reclaim> fmt::Debug for Snapshot<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{DeferredReclaim, MsQueue};

    #[test]
    fn test_empty_queue_yields_nothing() {
        let queue: MsQueue<u32> = MsQueue::new();
        assert_eq!(queue.snapshot().next(), None);
    }

    #[test]
    fn test_skips_dequeued_values() {
        let queue = MsQueue::new();
        queue.enqueue_all([1, 2, 3, 4]);
        let _ = queue.dequeue();
        assert_eq!(queue.snapshot().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_follows_appended_values() {
        let queue = MsQueue::with_reclaim(DeferredReclaim::new());
        queue.enqueue(1);

        let mut snapshot = queue.snapshot();
        assert_eq!(snapshot.next(), Some(1));
        assert_eq!(snapshot.next(), None);

        queue.enqueue(2);
        assert_eq!(snapshot.next(), Some(2));
    }

    #[test]
    fn test_survives_concurrent_dequeue() {
        let queue = MsQueue::new();
        queue.enqueue_all(0..8u64);

        let mut snapshot = queue.snapshot();
        assert_eq!(snapshot.next(), Some(0));

        // Nodes already reached stay readable while the snapshot is alive
        while queue.dequeue().is_ok() {}
        queue.flush();

        assert_eq!(snapshot.collect::<Vec<_>>(), (1..8).collect::<Vec<_>>());
    }
}
