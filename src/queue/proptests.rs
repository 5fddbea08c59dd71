//! Property-based tests for the queue using proptest
//!
//! Single-threaded operation sequences are checked against a `VecDeque` model; concurrent
//! runs are checked for conservation and per-producer ordering.

use crate::queue::MsQueue;
use crate::{DeferredReclaim, Error, Reclaim};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(i32),
    Dequeue,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<i32>().prop_map(Op::Enqueue),
        2 => Just(Op::Dequeue),
    ]
}

/// Apply `ops` to `queue` and a `VecDeque`, asserting they agree at every step
fn check_against_model<R: Reclaim>(
    queue: &MsQueue<i32, R>,
    ops: &[Op],
) -> Result<VecDeque<i32>, TestCaseError> {
    let mut model = VecDeque::new();

    for op in ops {
        match op {
            Op::Enqueue(value) => {
                queue.enqueue(*value);
                model.push_back(*value);
            }
            Op::Dequeue => {
                let expected = model.pop_front().ok_or(Error::QueueEmpty);
                prop_assert_eq!(queue.dequeue(), expected);
            }
        }
        prop_assert_eq!(queue.approximate_size(), model.len());
        prop_assert_eq!(queue.approximate_non_empty(), !model.is_empty());
    }

    Ok(model)
}

/// Property: the queue behaves like a `VecDeque` under any sequential history
#[cfg(test)]
mod model_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_matches_model_epoch(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let queue = MsQueue::new();
            let model = check_against_model(&queue, &ops)?;

            let rest: Vec<i32> = queue.into_iter().collect();
            prop_assert_eq!(rest, model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn test_matches_model_deferred(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let queue = MsQueue::with_reclaim(DeferredReclaim::new());
            let model = check_against_model(&queue, &ops)?;

            // One dummy retired per successful dequeue, none freed yet
            let enqueues = ops.iter().filter(|op| matches!(op, Op::Enqueue(_))).count();
            let stats = queue.reclaim_stats();
            prop_assert_eq!(stats.retired + model.len(), enqueues);
            prop_assert_eq!(stats.reclaimed, 0);
        }

        #[test]
        fn test_snapshot_equals_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let queue = MsQueue::new();
            let model = check_against_model(&queue, &ops)?;

            let seen: Vec<i32> = queue.snapshot().collect();
            prop_assert_eq!(seen, model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn test_fifo_ordering_batches(
            batches in prop::collection::vec(
                prop::collection::vec(any::<i32>(), 1..10),
                1..5
            )
        ) {
            let queue = MsQueue::new();
            let mut expected = Vec::new();

            for batch in &batches {
                prop_assert_eq!(queue.enqueue_all(batch.iter().copied()), batch.len());
                expected.extend(batch.iter().copied());
            }

            for value in expected {
                prop_assert_eq!(queue.dequeue(), Ok(value));
            }
            prop_assert_eq!(queue.dequeue(), Err(Error::QueueEmpty));
        }
    }
}

/// Property: concurrent histories conserve values and per-producer order
#[cfg(test)]
mod concurrent_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_concurrent_conservation(
            num_producers in 1usize..5,
            num_consumers in 1usize..5,
            items_per_producer in 10usize..300
        ) {
            let queue = Arc::new(MsQueue::<(usize, usize)>::new());
            let total = num_producers * items_per_producer;

            let producers: Vec<_> = (0..num_producers)
                .map(|producer_id| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        for seq in 0..items_per_producer {
                            queue.enqueue((producer_id, seq));
                        }
                    })
                })
                .collect();

            let consumers: Vec<_> = (0..num_consumers)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        let mut received = Vec::new();
                        for _ in 0..items_per_producer {
                            match queue.dequeue() {
                                Ok(item) => received.push(item),
                                Err(Error::QueueEmpty) => thread::yield_now(),
                            }
                        }
                        received
                    })
                })
                .collect();

            for handle in producers {
                handle.join().unwrap();
            }

            let mut all_received = Vec::new();
            for handle in consumers {
                let received = handle.join().unwrap();

                // Values of one producer reach one consumer in enqueue order
                for producer_id in 0..num_producers {
                    let seqs: Vec<_> = received
                        .iter()
                        .filter(|(p, _)| *p == producer_id)
                        .map(|(_, s)| *s)
                        .collect();
                    prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
                }
                all_received.extend(received);
            }

            while let Ok(item) = queue.dequeue() {
                all_received.push(item);
            }

            prop_assert_eq!(all_received.len(), total);
            all_received.sort_unstable();
            all_received.dedup();
            prop_assert_eq!(all_received.len(), total);
            prop_assert_eq!(queue.approximate_size(), 0);
        }
    }
}

/// Property: edge cases around the empty queue
#[cfg(test)]
mod edge_case_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_empty_queue_operations(polls in 1usize..50) {
            let queue: MsQueue<i32> = MsQueue::new();
            for _ in 0..polls {
                prop_assert_eq!(queue.dequeue(), Err(Error::QueueEmpty));
            }
            prop_assert_eq!(queue.approximate_size(), 0);
            prop_assert_eq!(queue.reclaim_stats().retired, 0);
        }

        #[test]
        fn test_refill_after_drain(value in any::<i32>(), rounds in 1usize..20) {
            let queue = MsQueue::with_reclaim(DeferredReclaim::new());
            for _ in 0..rounds {
                queue.enqueue(value);
                prop_assert_eq!(queue.dequeue(), Ok(value));
                prop_assert_eq!(queue.dequeue(), Err(Error::QueueEmpty));
            }
            prop_assert_eq!(queue.reclaim_stats().retired, rounds);
        }
    }
}
