//! Queue nodes

use crate::atomic::Link;
use core::mem::MaybeUninit;
use core::ptr;

/// A node in the queue's linked list
///
/// The value is written once, before the node is published by a link CAS, and never
/// mutated afterwards. Ownership of the value is tracked by the queue, not by the node:
///
/// - the initial dummy node never holds a value
/// - a node that became the dummy through a dequeue has had its value moved out
/// - every node after the dummy holds a live value
///
/// Dropping a `Node` therefore never drops its value; [`Node::destroy_with_value`] does.
pub(crate) struct Node<T> {
    value: MaybeUninit<T>,
    pub(crate) next: Link<Node<T>>,
}

impl<T> Node<T> {
    /// Allocate the initial dummy node
    pub(crate) fn sentinel() -> *mut Self {
        Box::into_raw(Box::new(Node {
            value: MaybeUninit::uninit(),
            next: Link::null(),
        }))
    }

    /// Allocate an unpublished node holding `value`
    pub(crate) fn new(value: T) -> *mut Self {
        Box::into_raw(Box::new(Node {
            value: MaybeUninit::new(value),
            next: Link::null(),
        }))
    }

    /// Move the value out of the node
    ///
    /// # Safety
    ///
    /// The node must hold a live value and the caller must be the only thread that
    /// takes it, which a successful head CAS onto this node guarantees.
    #[inline]
    pub(crate) unsafe fn take_value(node: *mut Self) -> T {
        unsafe { ptr::read((*node).value.as_ptr()) }
    }

    /// Copy the value out of the node without taking ownership
    ///
    /// # Safety
    ///
    /// The node must have been constructed with a value, and must still be allocated.
    #[inline]
    pub(crate) unsafe fn copy_value(node: *const Self) -> T
    where
        T: Copy,
    {
        unsafe { *(*node).value.as_ptr() }
    }

    /// Free the node without dropping its value
    ///
    /// # Safety
    ///
    /// `node` must come from [`Node::new`] or [`Node::sentinel`] and be freed only once.
    pub(crate) unsafe fn destroy(node: *mut Self) {
        drop(unsafe { Box::from_raw(node) });
    }

    /// Drop the node's value, then free the node
    ///
    /// # Safety
    ///
    /// Same as [`Node::destroy`], and the node must still hold a live value.
    pub(crate) unsafe fn destroy_with_value(node: *mut Self) {
        unsafe {
            ptr::drop_in_place((*node).value.as_mut_ptr());
            Self::destroy(node);
        }
    }
}
