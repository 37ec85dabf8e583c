//! # Script Decoding
//!
//! Turns script-authored events into bus events. State-machine configs
//! name the events they fire instead of hardcoding type numbers:
//!
//! ```toml
//! [[emit]]
//! event = "EntityDamaged"
//! fields = { entity = 12, amount = 30, critical = true }
//!
//! [[emit]]
//! event = "WaveCleared"
//! ```
//!
//! Decoding happens at load time. The resulting events are pushed as-is
//! when the state machine fires.

use std::collections::BTreeMap;

use cinder_bus::{BusError, BusResult, Event, EventRegistry, EventType, FieldValue, Payload};
use serde::{Deserialize, Serialize};

/// One authored event: a registered name plus field assignments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Registered event name.
    pub event: String,
    /// Field assignments for the event's payload record.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl EventSpec {
    /// An entry with no field assignments.
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field assignment.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

#[derive(Deserialize)]
struct ScriptDoc {
    #[serde(default)]
    emit: Vec<EventSpec>,
}

/// Parses the `[[emit]]` tables of a TOML document.
///
/// # Errors
///
/// `InvalidConfig` if the document is not valid TOML or an entry is
/// malformed.
pub fn load_script(source: &str) -> BusResult<Vec<EventSpec>> {
    let doc: ScriptDoc =
        toml::from_str(source).map_err(|e| BusError::InvalidConfig(e.to_string()))?;
    Ok(doc.emit)
}

/// Resolves an authored entry against the registry and builds its event.
///
/// Record events get a fresh zero-valued payload with the given fields
/// assigned; unassigned fields stay zero. Events without a record shape
/// (signals, and kinds whose payload is only built in code) decode to an
/// empty payload.
///
/// # Errors
///
/// - `UnknownEvent` if the name is not registered
/// - `NoPayload` if fields are given for an event without a record
/// - `UnknownField` / `FieldType` from the field assignments
pub fn decode_event(registry: &EventRegistry, spec: &EventSpec) -> BusResult<Event> {
    let event_type = registry
        .event_type(&spec.event)
        .ok_or_else(|| BusError::UnknownEvent(spec.event.clone()))?;

    let Some(mut record) = registry.new_payload(event_type) else {
        if !spec.fields.is_empty() {
            return Err(BusError::NoPayload(spec.event.clone()));
        }
        return Ok(Event::signal(event_type));
    };

    for (name, value) in &spec.fields {
        record.set_field(name, value.clone())?;
    }
    Ok(Event::new(event_type, Payload::Record(record)))
}

/// Parses a script and decodes every entry, stopping at the first error.
///
/// The Tick pseudo-event is rejected here: scripts cannot queue it.
///
/// # Errors
///
/// See [`load_script`] and [`decode_event`]. A `Tick` entry is reported as
/// `UnknownEvent`.
pub fn decode_script(registry: &EventRegistry, source: &str) -> BusResult<Vec<Event>> {
    let specs = load_script(source)?;
    let mut events = Vec::with_capacity(specs.len());
    for spec in &specs {
        let event = decode_event(registry, spec)?;
        if event.event_type == EventType::TICK {
            return Err(BusError::UnknownEvent(spec.event.clone()));
        }
        events.push(event);
    }
    tracing::debug!(events = events.len(), "Decoded event script");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        register_catalog, EntityDamaged, SoundCue, ENTITY_DAMAGED, WAVE_CLEARED,
    };

    fn registry() -> EventRegistry {
        let mut registry = EventRegistry::new();
        register_catalog(&mut registry);
        registry
    }

    #[test]
    fn test_decode_record() {
        let spec = EventSpec::new("EntityDamaged")
            .with_field("entity", FieldValue::Int(12))
            .with_field("amount", FieldValue::Int(30))
            .with_field("critical", FieldValue::Bool(true));

        let event = decode_event(&registry(), &spec).unwrap();
        assert_eq!(event.event_type, ENTITY_DAMAGED);
        assert_eq!(
            event.payload.record_as::<EntityDamaged>(),
            Some(&EntityDamaged {
                entity: 12,
                source: 0,
                amount: 30,
                critical: true,
            })
        );
    }

    #[test]
    fn test_decode_signal() {
        let event = decode_event(&registry(), &EventSpec::new("WaveCleared")).unwrap();
        assert_eq!(event.event_type, WAVE_CLEARED);
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_decode_tick() {
        let event = decode_event(&registry(), &EventSpec::new("tick")).unwrap();
        assert!(event.event_type.is_tick());
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_decode_errors() {
        let registry = registry();

        let err = decode_event(&registry, &EventSpec::new("Meteor")).unwrap_err();
        assert_eq!(err, BusError::UnknownEvent("Meteor".into()));

        let spec = EventSpec::new("WaveCleared").with_field("wave", FieldValue::Int(3));
        assert_eq!(
            decode_event(&registry, &spec).unwrap_err(),
            BusError::NoPayload("WaveCleared".into())
        );

        let spec = EventSpec::new("EntityDied").with_field("cause", FieldValue::Int(1));
        assert!(matches!(
            decode_event(&registry, &spec),
            Err(BusError::UnknownField { .. })
        ));

        let spec = EventSpec::new("EntityDied").with_field("entity", FieldValue::Int(-1));
        assert!(matches!(
            decode_event(&registry, &spec),
            Err(BusError::FieldType { .. })
        ));
    }

    #[test]
    fn test_decode_script() {
        let source = r#"
            [[emit]]
            event = "SoundCue"
            fields = { cue = "horn_low", volume = 0.5 }

            [[emit]]
            event = "WaveCleared"
        "#;

        let events = decode_script(&registry(), source).unwrap();
        assert_eq!(events.len(), 2);
        let cue = events[0].payload.record_as::<SoundCue>().unwrap();
        assert_eq!(cue.cue, "horn_low");
        assert!((cue.volume - 0.5).abs() < f32::EPSILON);
        assert_eq!(events[1].event_type, WAVE_CLEARED);
    }

    #[test]
    fn test_script_rejects_tick_and_bad_toml() {
        let registry = registry();
        assert!(matches!(
            decode_script(&registry, "[[emit]]\nevent = \"Tick\""),
            Err(BusError::UnknownEvent(_))
        ));
        assert!(matches!(
            decode_script(&registry, "[[emit]\nevent = "),
            Err(BusError::InvalidConfig(_))
        ));
        assert!(load_script("").unwrap().is_empty());
    }
}
