//! # Batch Pool
//!
//! Recycling store for batch payloads of one entry shape.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::event::{Event, EventType, Payload};
use crate::queue::EventQueue;

/// A reusable list of entries carried by a single bulk event.
///
/// The backing storage is retained across reuse cycles: clearing a batch
/// keeps its capacity, so refilling it up to the previous peak never
/// allocates.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch<T> {
    entries: Vec<T>,
}

impl<T> Batch<T> {
    /// Creates an empty batch with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends an entry.
    #[inline]
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries the batch can hold without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// The entries, in insertion order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Mutable access to the entries.
    #[inline]
    pub fn entries_mut(&mut self) -> &mut [T] {
        &mut self.entries
    }

    /// Removes all entries, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> Batch<T> {
    /// Appends copies of every entry in `entries`.
    pub fn extend_from_slice(&mut self, entries: &[T]) {
        self.entries.extend_from_slice(entries);
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Deref for Batch<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<'a, T> IntoIterator for &'a Batch<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A pool of [`Batch<T>`] instances for one entry shape.
///
/// Unbounded and lazily grown: an empty pool allocates a fresh batch with
/// the pool's seed capacity, and every released batch is kept for reuse.
///
/// # Thread Safety
///
/// Acquire and release may be called from any thread. The free list is
/// guarded internally; callers need no locking of their own.
///
/// # Example
///
/// ```rust,ignore
/// let pool: BatchPool<ParticleSpawn> = BatchPool::new(512);
///
/// let mut batch = pool.acquire(); // len() == 0, capacity() >= 512
/// batch.push(spark);
/// queue.push(Event::new(PARTICLE_BURST, Payload::from_batch(batch)));
///
/// // ...consumer side, after handling the event:
/// pool.release(event.payload.into_batch().ok());
/// ```
pub struct BatchPool<T> {
    /// Idle batches.
    free: Mutex<Vec<Box<Batch<T>>>>,
    /// Capacity seeded into freshly allocated batches.
    entry_capacity: usize,
    /// Batches ever allocated by this pool.
    allocated: AtomicUsize,
}

impl<T> BatchPool<T> {
    /// Creates a pool whose fresh batches hold `entry_capacity` entries
    /// without reallocating. Size it to the expected peak batch volume.
    #[must_use]
    pub fn new(entry_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            entry_capacity,
            allocated: AtomicUsize::new(0),
        }
    }

    /// Creates and prewarms a pool from configuration.
    #[must_use]
    pub fn from_config(config: &PoolConfig) -> Self {
        let pool = Self::new(config.entry_capacity);
        pool.prewarm(config.prewarm);
        pool
    }

    /// Returns an empty batch, recycled when one is idle.
    ///
    /// The returned batch always has `len() == 0`. A recycled batch keeps
    /// whatever capacity it grew to in earlier use.
    #[must_use]
    pub fn acquire(&self) -> Box<Batch<T>> {
        let recycled = self.free.lock().pop();
        match recycled {
            Some(mut batch) => {
                batch.clear();
                batch
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Box::new(Batch::with_capacity(self.entry_capacity))
            }
        }
    }

    /// Returns a batch to the pool. `None` is a no-op.
    ///
    /// Ownership moves into the pool, so nothing can keep reading the
    /// entries after release.
    pub fn release(&self, batch: Option<Box<Batch<T>>>) {
        let Some(mut batch) = batch else {
            return;
        };
        batch.clear();
        self.free.lock().push(batch);
    }

    /// Allocates `count` batches up front so the first bursts of a session
    /// do not pay for them.
    pub fn prewarm(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut free = self.free.lock();
        free.reserve(count);
        for _ in 0..count {
            free.push(Box::new(Batch::with_capacity(self.entry_capacity)));
        }
        self.allocated.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(
            count,
            entry_capacity = self.entry_capacity,
            "batch pool prewarmed"
        );
    }

    /// Number of idle batches.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Number of batches this pool has ever allocated.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Seed capacity of freshly allocated batches.
    #[inline]
    #[must_use]
    pub const fn entry_capacity(&self) -> usize {
        self.entry_capacity
    }
}

impl<T> std::fmt::Debug for BatchPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPool")
            .field("entry_capacity", &self.entry_capacity)
            .field("idle", &self.idle())
            .field("allocated", &self.allocated())
            .finish()
    }
}

/// Copies `entries` into a pooled batch and pushes it as one event.
///
/// Does nothing when `entries` is empty. Returns whether an event was pushed.
pub fn emit_batch<T: Clone + Send + 'static>(
    queue: &EventQueue,
    pool: &BatchPool<T>,
    event_type: EventType,
    entries: &[T],
) -> bool {
    if entries.is_empty() {
        return false;
    }

    let mut batch = pool.acquire();
    batch.extend_from_slice(entries);
    queue.push(Event::new(event_type, Payload::from_batch(batch)));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_empty() {
        let pool: BatchPool<u32> = BatchPool::new(8);

        let mut batch = pool.acquire();
        assert!(batch.is_empty());
        assert!(batch.capacity() >= 8);

        batch.extend_from_slice(&[1, 2, 3]);
        pool.release(Some(batch));

        let batch = pool.acquire();
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_capacity_retained() {
        let pool: BatchPool<u64> = BatchPool::new(4);

        let mut batch = pool.acquire();
        for i in 0..1000 {
            batch.push(i);
        }
        let grown = batch.capacity();
        pool.release(Some(batch));

        let batch = pool.acquire();
        assert!(batch.capacity() >= 1000);
        assert_eq!(batch.capacity(), grown);
        assert_eq!(pool.allocated(), 1); // Same batch reused
    }

    #[test]
    fn test_release_none_is_noop() {
        let pool: BatchPool<u8> = BatchPool::new(1);
        pool.release(None);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_prewarm() {
        let pool: BatchPool<u8> = BatchPool::new(16);
        pool.prewarm(3);
        assert_eq!(pool.idle(), 3);
        assert_eq!(pool.allocated(), 3);

        let _a = pool.acquire();
        assert_eq!(pool.idle(), 2);
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_emit_batch_skips_empty() {
        let queue = EventQueue::new(8);
        let pool: BatchPool<u32> = BatchPool::new(4);

        assert!(!emit_batch(&queue, &pool, EventType(5), &[]));
        assert_eq!(queue.len(), 0);
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn test_emit_batch_copies_entries() {
        let queue = EventQueue::new(8);
        let pool: BatchPool<u32> = BatchPool::new(4);
        let source = vec![10, 20, 30];

        assert!(emit_batch(&queue, &pool, EventType(5), &source));

        let mut events = queue.consume();
        assert_eq!(events.len(), 1);
        let event = events.pop().unwrap();
        assert_eq!(event.event_type, EventType(5));

        let batch = event.payload.into_batch::<u32>().unwrap();
        assert_eq!(batch.entries(), source.as_slice());
        pool.release(Some(batch));
        assert_eq!(pool.idle(), 1);
    }
}
