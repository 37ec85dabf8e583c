//! # Events and Payloads
//!
//! An [`Event`] is a `(type, payload)` pair. The type is a small integer; the
//! payload is one of four shapes, and the event type tells the consumer which
//! one to expect:
//!
//! ```text
//! Payload::Empty        pure signal (no data)
//! Payload::Scalar(u64)  bit-packed value, never touches the heap
//! Payload::Record(..)   a typed record, built by code or by the registry
//! Payload::Batch(..)    a pooled Batch<T>, must go back to its pool
//! ```

use std::any::Any;
use std::fmt;

use crate::pool::Batch;
use crate::registry::PayloadRecord;

/// Event type discriminator.
///
/// Type `0` is reserved for the engine's per-frame tick, a scheduler-driven
/// pseudo-event that never travels through the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(pub u16);

impl EventType {
    /// The per-frame tick sentinel.
    pub const TICK: Self = Self(0);

    /// Creates an event type from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns true for the tick sentinel.
    #[inline]
    #[must_use]
    pub const fn is_tick(self) -> bool {
        self.0 == Self::TICK.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload carried by an event.
#[derive(Default)]
pub enum Payload {
    /// No data.
    #[default]
    Empty,
    /// A bit-packed scalar.
    Scalar(u64),
    /// A typed record.
    Record(Box<dyn PayloadRecord>),
    /// A pooled batch (`Box<Batch<T>>` erased). Release it to its pool
    /// after processing.
    Batch(Box<dyn Any + Send>),
}

impl Payload {
    /// Wraps a pooled batch. The box moves as-is; no allocation.
    #[must_use]
    pub fn from_batch<T: Send + 'static>(batch: Box<Batch<T>>) -> Self {
        Self::Batch(batch)
    }

    /// Wraps a record.
    #[must_use]
    pub fn from_record<R: PayloadRecord>(record: R) -> Self {
        Self::Record(Box::new(record))
    }

    /// Returns true if there is no payload.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the scalar value, if this is a scalar payload.
    #[inline]
    #[must_use]
    pub const fn scalar(&self) -> Option<u64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the record, if this is a record payload.
    #[must_use]
    pub fn record(&self) -> Option<&dyn PayloadRecord> {
        match self {
            Self::Record(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Returns the record as its concrete type.
    #[must_use]
    pub fn record_as<R: PayloadRecord>(&self) -> Option<&R> {
        self.record()?.as_any().downcast_ref::<R>()
    }

    /// Takes the record out as its concrete type.
    #[must_use]
    pub fn into_record<R: PayloadRecord>(self) -> Option<Box<R>> {
        match self {
            Self::Record(record) => record.into_any().downcast::<R>().ok(),
            _ => None,
        }
    }

    /// Borrows the batch as `Batch<T>`.
    ///
    /// Returns `None` for non-batch payloads or a different entry shape.
    #[must_use]
    pub fn batch<T: 'static>(&self) -> Option<&Batch<T>> {
        match self {
            Self::Batch(batch) => batch.downcast_ref::<Batch<T>>(),
            _ => None,
        }
    }

    /// Takes the batch out as `Batch<T>`, handing the payload back unchanged
    /// when it is something else.
    ///
    /// # Errors
    ///
    /// Returns the original payload if it is not a `Batch<T>`.
    pub fn into_batch<T: 'static>(self) -> Result<Box<Batch<T>>, Self> {
        match self {
            Self::Batch(batch) => batch.downcast::<Batch<T>>().map_err(Self::Batch),
            other => Err(other),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Scalar(value) => f.debug_tuple("Scalar").field(&format_args!("{value:#018x}")).finish(),
            Self::Record(record) => f.debug_tuple("Record").field(record).finish(),
            Self::Batch(_) => f.write_str("Batch(..)"),
        }
    }
}

/// A `(type, payload)` pair travelling through the queue.
#[derive(Debug, Default)]
pub struct Event {
    /// What happened.
    pub event_type: EventType,
    /// Data attached to it.
    pub payload: Payload,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub const fn new(event_type: EventType, payload: Payload) -> Self {
        Self { event_type, payload }
    }

    /// Creates a payload-less signal event.
    #[inline]
    #[must_use]
    pub const fn signal(event_type: EventType) -> Self {
        Self::new(event_type, Payload::Empty)
    }

    /// Creates a scalar event.
    #[inline]
    #[must_use]
    pub const fn scalar(event_type: EventType, value: u64) -> Self {
        Self::new(event_type, Payload::Scalar(value))
    }

    /// Creates a record event.
    #[must_use]
    pub fn record<R: PayloadRecord>(event_type: EventType, record: R) -> Self {
        Self::new(event_type, Payload::from_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_sentinel() {
        assert!(EventType::TICK.is_tick());
        assert!(!EventType::new(7).is_tick());
        assert_eq!(EventType::default(), EventType::TICK);
    }

    #[test]
    fn test_scalar_payload() {
        let event = Event::scalar(EventType(3), 0xDEAD_BEEF);
        assert_eq!(event.payload.scalar(), Some(0xDEAD_BEEF));
        assert!(event.payload.record().is_none());
        assert!(event.payload.batch::<u32>().is_none());
    }

    #[test]
    fn test_batch_payload_shape_mismatch_hands_back() {
        let mut batch: Box<Batch<u32>> = Box::default();
        batch.push(9);
        let payload = Payload::from_batch(batch);

        assert!(payload.batch::<u64>().is_none());
        let payload = payload.into_batch::<u64>().unwrap_err();
        let batch = payload.into_batch::<u32>().unwrap();
        assert_eq!(batch.entries(), &[9]);
    }
}
