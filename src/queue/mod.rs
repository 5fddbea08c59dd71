//! Queue implementation
//!
//! This module provides the Michael-Scott lock-free FIFO queue and its traversal view.
//!
//! ## Available Types
//!
//! - [`MsQueue`]: Unbounded multi-producer, multi-consumer queue
//! - [`Snapshot`]: Best-effort iterator over the queue's values
//! - [`IntoIter`]: Owning iterator that drains a queue
//!
//! ## Design
//!
//! - **Lock-free**: Some thread always completes its operation in a bounded number of steps
//! - **Helping**: A lagging tail is advanced by whichever thread finds it
//! - **Pluggable reclamation**: Retired nodes go through a [`Reclaim`](crate::Reclaim) scheme
//! - **Cache optimization**: `head` and `tail` live on separate cache lines
//!
//! ## Examples
//!
//! ```rust
//! use msqueue::{DeferredReclaim, MsQueue};
//!
//! // Epoch-based reclamation for long-running queues
//! let queue = MsQueue::new();
//! queue.enqueue(42);
//! assert_eq!(queue.dequeue(), Ok(42));
//!
//! // Deferred reclamation for tests and short-lived queues
//! let queue = MsQueue::with_reclaim(DeferredReclaim::new());
//! queue.enqueue("hello");
//! assert_eq!(queue.dequeue(), Ok("hello"));
//! ```

mod ms;
mod node;
mod snapshot;

pub use ms::{IntoIter, MsQueue};
pub use snapshot::Snapshot;


#[cfg(test)]
mod proptests;
