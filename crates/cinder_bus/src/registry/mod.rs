//! # Event Type Registry
//!
//! Maps human-readable event names to event types and payload shapes, so
//! authored scripts can say `"EntityDamaged"` and the runtime can build the
//! right record without compile-time knowledge of it.
//!
//! Built once during startup, before any producer thread exists, and only
//! read afterwards.

mod record;

pub use record::{FieldKind, FieldValue, PayloadRecord};

use std::collections::HashMap;

use crate::event::EventType;

/// Name of the per-frame tick pseudo-event.
pub const TICK_NAME: &str = "Tick";

/// Name ↔ type ↔ payload shape lookup table.
#[derive(Debug, Default)]
pub struct EventRegistry {
    by_name: HashMap<String, EventType>,
    by_type: HashMap<EventType, String>,
    /// Zero-valued prototype per event type that carries a record.
    shapes: HashMap<EventType, Box<dyn PayloadRecord>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name ↔ event_type`, and the payload shape of `sample` if one
    /// is given (`None` marks a pure signal event).
    ///
    /// Registering a name or type again silently replaces the earlier entry.
    pub fn register_type(
        &mut self,
        name: &str,
        event_type: EventType,
        sample: Option<&dyn PayloadRecord>,
    ) {
        self.by_name.insert(name.to_string(), event_type);
        self.by_type.insert(event_type, name.to_string());
        match sample {
            Some(sample) => {
                self.shapes.insert(event_type, sample.blank());
            }
            None => {
                self.shapes.remove(&event_type);
            }
        }
    }

    /// Looks up an event type by name.
    ///
    /// `"Tick"` matches case-insensitively and always yields
    /// [`EventType::TICK`]; every other name is an exact, case-sensitive
    /// match.
    #[must_use]
    pub fn event_type(&self, name: &str) -> Option<EventType> {
        if name.eq_ignore_ascii_case(TICK_NAME) {
            return Some(EventType::TICK);
        }
        self.by_name.get(name).copied()
    }

    /// Looks up the name of an event type. The tick sentinel is always
    /// `"Tick"`, registered or not.
    #[must_use]
    pub fn event_name(&self, event_type: EventType) -> Option<&str> {
        if event_type.is_tick() {
            return Some(TICK_NAME);
        }
        self.by_type.get(&event_type).map(String::as_str)
    }

    /// Builds a new zero-valued payload for `event_type`.
    ///
    /// `None` for signal events and unregistered types.
    #[must_use]
    pub fn new_payload(&self, event_type: EventType) -> Option<Box<dyn PayloadRecord>> {
        self.shapes.get(&event_type).map(|shape| shape.blank())
    }

    /// Returns true if `event_type` carries a record payload.
    #[must_use]
    pub fn has_payload(&self, event_type: EventType) -> bool {
        self.shapes.contains_key(&event_type)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
