//! # Handoff Queue - Lock-Free Ownership Transfer
//!
//! ## Purpose
//!
//! Multi-producer / multi-consumer FIFO that moves owned values between tasks
//! without a blocking lock. Beacons use it between heartbeat generation and
//! batch transmission; listeners use it between socket readers and parser
//! workers.
//!
//! ## Guarantees
//!
//! - Every enqueued value is dequeued by exactly one consumer
//! - Values from a single producer are dequeued in the order they were enqueued
//! - `dequeue` never blocks; an empty queue returns `None`
//!
//! Node reclamation is handled by `lockfree::queue::Queue`, so the wrapper only
//! adds occupancy accounting on top of it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free FIFO with enqueue/dequeue counters
pub struct HandoffQueue<T> {
    inner: lockfree::queue::Queue<T>,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
}

impl<T> HandoffQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: lockfree::queue::Queue::new(),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
        }
    }

    /// Append a value; never blocks and never fails
    #[inline]
    pub fn enqueue(&self, value: T) {
        self.inner.push(value);
        self.enqueued.fetch_add(1, Ordering::Release);
    }

    /// Remove the oldest value, or `None` if the queue is empty
    #[inline]
    pub fn dequeue(&self) -> Option<T> {
        let value = self.inner.pop();
        if value.is_some() {
            self.dequeued.fetch_add(1, Ordering::Release);
        }
        value
    }

    /// Dequeue up to `max` values in FIFO order
    pub fn dequeue_up_to(&self, max: usize) -> Vec<T> {
        let mut values = Vec::with_capacity(max.min(64));
        while values.len() < max {
            match self.dequeue() {
                Some(value) => values.push(value),
                None => break,
            }
        }
        values
    }

    /// Remove and drop everything still queued, returning how many were released
    pub fn drain(&self) -> usize {
        let mut released = 0;
        while self.dequeue().is_some() {
            released += 1;
        }
        released
    }

    /// Approximate number of queued values
    ///
    /// Exact when no operation is in flight; may briefly lag concurrent callers.
    pub fn len(&self) -> usize {
        let enqueued = self.enqueued.load(Ordering::Acquire);
        let dequeued = self.dequeued.load(Ordering::Acquire);
        enqueued.saturating_sub(dequeued) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Acquire)
    }

    pub fn total_dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Acquire)
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for HandoffQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffQueue")
            .field("enqueued", &self.total_enqueued())
            .field("dequeued", &self.total_dequeued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_fifo_single_thread() {
        let queue = HandoffQueue::new();
        for i in 0..10 {
            queue.enqueue(i);
        }
        assert_eq!(queue.len(), 10);
        for i in 0..10 {
            assert_eq!(queue.dequeue(), Some(i));
        }
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_up_to_does_not_pad() {
        let queue = HandoffQueue::new();
        for i in 0..3 {
            queue.enqueue(i);
        }
        assert_eq!(queue.dequeue_up_to(10), vec![0, 1, 2]);
        assert!(queue.dequeue_up_to(10).is_empty());

        for i in 0..25 {
            queue.enqueue(i);
        }
        assert_eq!(queue.dequeue_up_to(10).len(), 10);
        assert_eq!(queue.len(), 15);
    }

    #[test]
    fn test_drain_releases_everything() {
        let queue = HandoffQueue::new();
        for i in 0..100 {
            queue.enqueue(format!("entry-{}", i));
        }
        assert_eq!(queue.drain(), 100);
        assert_eq!(queue.total_enqueued(), 100);
        assert_eq!(queue.total_dequeued(), 100);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_no_loss_no_duplication_across_threads() {
        const PRODUCERS: u64 = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: u64 = 10_000;

        let queue = Arc::new(HandoffQueue::new());
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue((p, i));
                    }
                })
            })
            .collect();

        let total = PRODUCERS * PER_PRODUCER;
        let consumed = Arc::new(AtomicU64::new(0));
        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let consumed = Arc::clone(&consumed);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    let mut last_per_producer = vec![None::<u64>; PRODUCERS as usize];
                    while consumed.load(Ordering::Acquire) < total {
                        match queue.dequeue() {
                            Some((p, i)) => {
                                // Per-producer order holds within one consumer's view
                                if let Some(prev) = last_per_producer[p as usize] {
                                    assert!(i > prev, "producer {} reordered: {} after {}", p, i, prev);
                                }
                                last_per_producer[p as usize] = Some(i);
                                seen.push((p, i));
                                consumed.fetch_add(1, Ordering::AcqRel);
                            }
                            None => std::thread::yield_now(),
                        }
                    }
                    seen
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let mut all = HashSet::new();
        for consumer in consumers {
            for entry in consumer.join().unwrap() {
                assert!(all.insert(entry), "duplicate delivery of {:?}", entry);
            }
        }
        assert_eq!(all.len() as u64, total);
        assert!(queue.is_empty());
    }
}
