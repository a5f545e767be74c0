//! FIFO staging queues between producer, synchronizer and consumer.
//!
//! Two queues decouple the rate at which bytes arrive and frames are consumed
//! from the synchronizer's per-byte processing:
//! - [`InputQueue`]: raw byte chunks awaiting synchronization
//! - [`OutputQueue`]: validated frames awaiting consumption
//!
//! Queues carry opaque values and impose no framing logic of their own.
//!
//! # Thread Safety
//!
//! All methods take `&self`; the entries sit behind a mutex so one producer
//! and one consumer can share a queue through an `Arc` without tearing.
//! `dequeue` never blocks waiting for data: an empty queue answers `None`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::framing::Frame;

/// Queue of raw byte chunks awaiting synchronization
pub type InputQueue = StagingQueue<Vec<u8>>;

/// Queue of validated frames awaiting consumption
pub type OutputQueue = StagingQueue<Frame>;

/// Unbounded FIFO with value-semantics entries.
#[derive(Debug)]
pub struct StagingQueue<T> {
    entries: Mutex<VecDeque<T>>,
}

impl<T> StagingQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Create an empty queue with room for `capacity` entries.
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the storage cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut entries = VecDeque::new();
        entries
            .try_reserve(capacity)
            .map_err(|e| Error::exhausted("queue storage", e))?;

        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    /// Append `item` at the back. Amortized O(1).
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the queue cannot grow. The queue is left
    /// unchanged and `item` is dropped.
    pub fn enqueue(&self, item: T) -> Result<()> {
        let mut entries = self.lock();
        entries
            .try_reserve(1)
            .map_err(|e| Error::exhausted("queue entry", e))?;
        entries.push_back(item);
        Ok(())
    }

    /// Remove and return the oldest entry, or `None` if the queue is empty.
    ///
    /// An empty queue is an expected, pollable state; it is not modified.
    pub fn dequeue(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove every entry, oldest first.
    pub fn drain_all(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still guards a consistent deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for StagingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = StagingQueue::new();
        queue.enqueue(vec![1u8]).unwrap();
        queue.enqueue(vec![2u8, 3]).unwrap();
        queue.enqueue(vec![]).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Some(vec![1]));
        assert_eq!(queue.dequeue(), Some(vec![2, 3]));
        assert_eq!(queue.dequeue(), Some(vec![]));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_empty_dequeue_is_not_an_error() {
        let queue: InputQueue = StagingQueue::new();

        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        // Still usable afterwards
        queue.enqueue(vec![7]).unwrap();
        assert_eq!(queue.dequeue(), Some(vec![7]));
    }

    #[test]
    fn test_with_capacity() {
        let queue = StagingQueue::<u32>::with_capacity(16).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_with_capacity_overflow() {
        let result = StagingQueue::<u32>::with_capacity(usize::MAX);
        assert!(matches!(
            result,
            Err(Error::ResourceExhausted {
                what: "queue storage",
                ..
            })
        ));
    }

    #[test]
    fn test_drain_all() {
        let queue = StagingQueue::new();
        for i in 0..5u32 {
            queue.enqueue(i).unwrap();
        }

        assert_eq!(queue.drain_all(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_interleaved_enqueue_dequeue() {
        let queue = StagingQueue::new();
        queue.enqueue(1u32).unwrap();
        queue.enqueue(2).unwrap();
        assert_eq!(queue.dequeue(), Some(1));
        queue.enqueue(3).unwrap();
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_single_producer_single_consumer() {
        let queue = Arc::new(StagingQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    queue.enqueue(i).unwrap();
                }
            })
        };

        let mut received = Vec::with_capacity(1000);
        while received.len() < 1000 {
            match queue.dequeue() {
                Some(value) => received.push(value),
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }
}
