//! # Lock-Free MPSC Event Queue
//!
//! Fixed-capacity ring buffer shared by every gameplay system (producers)
//! and the engine tick (the single consumer).
//!
//! ## Safety Note
//!
//! Slots are written in place through `UnsafeCell`. Every access is gated by
//! the slot's atomic state, documented on each unsafe block below.

#![allow(unsafe_code)]
//!
//! ## Architecture
//!
//! ```text
//!   Producer 1 ──┐   CAS tail    ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!   Producer 2 ──┼─────────────> │ R │ R │ W │ R │ E │ E │ E │ E │
//!   Producer N ──┘               └───┴───┴───┴───┴───┴───┴───┴───┘
//!                                  ▲ head          ▲ tail
//!                                  │
//!   Tick (consumer) ── consume() ──┘  stops at the first slot not READY
//! ```
//!
//! ## Slot States
//!
//! ```text
//!   EMPTY ──> WRITING ──> READY ──> READING ──> EMPTY
//!               ▲           │
//!               └───────────┘  overwrite-on-full (lapping producer)
//! ```
//!
//! A slot is READY only after its event and sequence stamp are written, so
//! the consumer never sees a half-written slot. A producer that laps the
//! buffer waits out a READING slot instead of writing under the consumer.
//!
//! ## Overflow
//!
//! Producers never block. When a push would leave more than `capacity`
//! unread events, `head` is raised to `tail - capacity` and the oldest
//! unread events are lost. The raise is a single `fetch_max`, so concurrent
//! trims from producers and the consumer's own advance can never move `head`
//! backwards or evict twice.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crossbeam_utils::CachePadded;

use crate::config::QueueConfig;
use crate::event::Event;

/// Slot is free (never written, or consumed).
const EMPTY: u8 = 0;
/// A producer owns the slot.
const WRITING: u8 = 1;
/// Event published and readable.
const READY: u8 = 2;
/// The consumer owns the slot.
const READING: u8 = 3;

/// Upper bound on consume passes restarted by concurrent overflow trims.
/// Whatever is left is picked up next tick.
const MAX_CONSUME_PASSES: usize = 8;

/// One ring-buffer slot.
struct Slot {
    /// Publication state (EMPTY / WRITING / READY / READING).
    state: AtomicU8,
    /// Queue position of the event last written here.
    seq: AtomicU64,
    /// The event. Accessed only by whoever moved `state` to WRITING or READING.
    event: UnsafeCell<Option<Event>>,
}

// SAFETY: `event` is only touched by the thread that won the WRITING or
// READING transition on `state`, and `Event` is `Send`.
unsafe impl Sync for Slot {}

impl Slot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            seq: AtomicU64::new(0),
            event: UnsafeCell::new(None),
        }
    }

    /// Writes `event` for queue position `seq`.
    ///
    /// Hands the event back if the slot already holds a newer position: this
    /// producer was lapped while it raced for the slot, so its event is
    /// already evicted.
    fn write(&self, seq: u64, event: Event) -> Result<(), Event> {
        let previous = loop {
            let current = self.state.load(Ordering::Relaxed);
            if (current == EMPTY || current == READY)
                && self
                    .state
                    .compare_exchange_weak(current, WRITING, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                break current;
            }
            // A reader or another (lapping) writer holds it; both finish in
            // a handful of instructions.
            std::hint::spin_loop();
        };

        if self.seq.load(Ordering::Relaxed) > seq {
            self.state.store(previous, Ordering::Release);
            return Err(event);
        }

        // SAFETY: state is WRITING and we set it, so no other thread reads or
        // writes `event` until we store READY below.
        let stale = unsafe { (*self.event.get()).replace(event) };
        self.seq.store(seq, Ordering::Relaxed);
        self.state.store(READY, Ordering::Release);

        // Unread event from an older lap; the head trim already counted it.
        drop(stale);
        Ok(())
    }

    /// Takes the event for queue position `seq` if it is published.
    fn take(&self, seq: u64) -> Option<Event> {
        if self
            .state
            .compare_exchange(READY, READING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }

        if self.seq.load(Ordering::Relaxed) != seq {
            // Older stamp: the producer for `seq` has not written yet.
            // Newer stamp: `seq` was overwritten.
            self.state.store(READY, Ordering::Release);
            return None;
        }

        // SAFETY: state is READING and we set it; producers spin until we
        // store EMPTY below.
        let event = unsafe { (*self.event.get()).take() };
        self.state.store(EMPTY, Ordering::Release);
        event
    }
}

/// Lock-free multi-producer, single-consumer event queue.
///
/// `push` may be called from any number of threads at once and never blocks
/// or fails. `consume` is meant for one caller per tick.
///
/// # Example
///
/// ```rust,ignore
/// let queue = EventQueue::new(4096);
///
/// // Any gameplay system, any thread
/// queue.push(Event::scalar(STATUS_EFFECT, packed));
///
/// // Engine tick, once per frame
/// for event in queue.consume() {
///     dispatch(event);
/// }
/// ```
pub struct EventQueue {
    /// The ring. Length is a power of two.
    slots: Box<[Slot]>,
    /// `capacity - 1`.
    mask: u64,
    /// Next position to read.
    head: CachePadded<AtomicU64>,
    /// Next position to write.
    tail: CachePadded<AtomicU64>,
    /// Events lost to overwrite-on-full (approximate).
    evicted: AtomicU64,
}

impl EventQueue {
    /// Creates a queue holding at least `capacity` events.
    ///
    /// Capacity is rounded up to a power of two (minimum 2). All slots are
    /// allocated here; the queue never grows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let slots: Vec<Slot> = (0..capacity).map(|_| Slot::new()).collect();

        tracing::debug!(capacity, "event queue allocated");

        Self {
            slots: slots.into_boxed_slice(),
            mask: capacity as u64 - 1,
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            evicted: AtomicU64::new(0),
        }
    }

    /// Creates a queue from configuration.
    #[must_use]
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, position: u64) -> &Slot {
        &self.slots[(position & self.mask) as usize]
    }

    /// Publishes an event.
    ///
    /// Never blocks and never fails. If the queue already holds `capacity`
    /// unread events, the oldest one is discarded.
    pub fn push(&self, event: Event) {
        let mut tail = self.tail.load(Ordering::Relaxed);
        loop {
            match self.tail.compare_exchange_weak(
                tail,
                tail + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => tail = actual,
            }
        }

        let next = tail + 1;
        if self.slot(tail).write(tail, event).is_err() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }

        let capacity = self.capacity() as u64;
        let head = self.head.load(Ordering::Acquire);
        if next.saturating_sub(head) > capacity {
            let floor = next - capacity;
            let previous = self.head.fetch_max(floor, Ordering::AcqRel);
            if previous < floor {
                let dropped = floor - previous;
                self.evicted.fetch_add(dropped, Ordering::Relaxed);
                tracing::trace!(dropped, "event queue full, oldest events evicted");
            }
        }
    }

    /// Drains every fully-published event, oldest first.
    ///
    /// Stops at the first slot whose producer is still writing; that event
    /// and everything after it are returned by a later call. Never waits.
    #[must_use]
    pub fn consume(&self) -> Vec<Event> {
        let mut events = Vec::new();
        self.consume_into(&mut events);
        events
    }

    /// Like [`consume`](Self::consume), appending into a caller-owned buffer
    /// so one allocation can serve every frame. Returns how many events were
    /// appended.
    pub fn consume_into(&self, out: &mut Vec<Event>) -> usize {
        let start_len = out.len();
        let capacity = self.capacity() as u64;
        let mut position = self.head.load(Ordering::Acquire);

        for _ in 0..MAX_CONSUME_PASSES {
            let tail = self.tail.load(Ordering::Acquire);
            position = position.max(self.head.load(Ordering::Acquire));
            if tail.saturating_sub(position) > capacity {
                position = tail - capacity;
            }

            while position < tail {
                let Some(event) = self.slot(position).take(position) else {
                    break;
                };
                out.push(event);
                position += 1;
            }

            let previous = self.head.fetch_max(position, Ordering::AcqRel);
            if previous <= position {
                break;
            }
            // Producers trimmed past us mid-walk. Everything collected is
            // older and was read intact; continue from the new head.
            position = previous;
        }

        out.len() - start_len
    }

    /// Approximate number of unread events.
    ///
    /// Not consistent with concurrent push/consume; use it for heuristics
    /// and stats only.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.saturating_sub(head).min(self.capacity() as u64) as usize
    }

    /// Returns true if no unread events are pending (approximate).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events discarded by overwrite-on-full since creation (approximate).
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("evicted", &self.evicted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;

    fn push_seq(queue: &EventQueue, values: std::ops::Range<u64>) {
        for v in values {
            queue.push(Event::scalar(EventType(1), v));
        }
    }

    fn scalars(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.payload.scalar().unwrap()).collect()
    }

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(EventQueue::new(0).capacity(), 2);
        assert_eq!(EventQueue::new(8).capacity(), 8);
        assert_eq!(EventQueue::new(1000).capacity(), 1024);
    }

    #[test]
    fn test_fifo_within_capacity() {
        let queue = EventQueue::new(16);
        push_seq(&queue, 0..16);
        assert_eq!(queue.len(), 16);

        let events = queue.consume();
        assert_eq!(scalars(&events), (0..16).collect::<Vec<_>>());
        assert!(queue.is_empty());
        assert!(queue.consume().is_empty());
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let queue = EventQueue::new(8);
        push_seq(&queue, 0..13);

        assert_eq!(queue.len(), 8);
        assert_eq!(queue.evicted(), 5);

        let events = queue.consume();
        assert_eq!(scalars(&events), (5..13).collect::<Vec<_>>());
    }

    #[test]
    fn test_capacity_eight_scenario() {
        // A..H fits exactly.
        let queue = EventQueue::new(8);
        push_seq(&queue, 0..8);
        assert_eq!(scalars(&queue.consume()), (0..8).collect::<Vec<_>>());

        // Ten pushes with nothing consumed in between: A, B are evicted.
        let queue = EventQueue::new(8);
        push_seq(&queue, 0..10);
        assert_eq!(scalars(&queue.consume()), (2..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_wraparound_after_consume() {
        let queue = EventQueue::new(4);
        for round in 0..10u64 {
            push_seq(&queue, round * 3..round * 3 + 3);
            let events = queue.consume();
            assert_eq!(scalars(&events), (round * 3..round * 3 + 3).collect::<Vec<_>>());
        }
        assert_eq!(queue.evicted(), 0);
    }

    #[test]
    fn test_in_flight_slot_stops_walk() {
        let queue = EventQueue::new(8);
        push_seq(&queue, 0..2);

        // Claim position 2 without publishing it, as a producer mid-write would.
        let claimed = queue.tail.fetch_add(1, Ordering::AcqRel);
        assert_eq!(claimed, 2);
        push_seq(&queue, 3..5);

        assert_eq!(scalars(&queue.consume()), vec![0, 1]);
        // Nothing is delivered past the gap.
        assert!(queue.consume().is_empty());

        // The slow producer finishes.
        assert!(queue.slot(2).write(2, Event::scalar(EventType(1), 2)).is_ok());
        assert_eq!(scalars(&queue.consume()), vec![2, 3, 4]);
    }

    #[test]
    fn test_consume_into_appends() {
        let queue = EventQueue::new(8);
        let mut buffer = Vec::with_capacity(8);

        push_seq(&queue, 0..3);
        assert_eq!(queue.consume_into(&mut buffer), 3);
        push_seq(&queue, 3..5);
        assert_eq!(queue.consume_into(&mut buffer), 2);

        assert_eq!(scalars(&buffer), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_lapped_writer_is_discarded() {
        let queue = EventQueue::new(2);
        // Position 3 lands in slot 1 first.
        assert!(queue.slot(3).write(3, Event::scalar(EventType(1), 3)).is_ok());
        // The writer for position 1 arrives late: its event is already stale.
        let stale = queue.slot(1).write(1, Event::scalar(EventType(1), 1));
        assert_eq!(stale.unwrap_err().payload.scalar(), Some(1));
        // The newer event is untouched.
        assert_eq!(queue.slot(3).take(3).unwrap().payload.scalar(), Some(3));
    }
}
