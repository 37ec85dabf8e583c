//! # Global Event Registry
//!
//! The process-wide registry holding the engine catalog. Initialized once
//! during startup, before any producer thread exists; read-only afterwards.

use std::sync::OnceLock;

use cinder_bus::EventRegistry;

use crate::catalog::register_catalog;

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

/// Populates the global registry with the engine catalog.
///
/// Idempotent: later calls return the registry built by the first one.
pub fn init_registry() -> &'static EventRegistry {
    REGISTRY.get_or_init(|| {
        let mut registry = EventRegistry::new();
        register_catalog(&mut registry);
        tracing::info!(events = registry.len(), "Event registry initialized");
        registry
    })
}

/// The global registry, initializing it on first use.
#[must_use]
pub fn global() -> &'static EventRegistry {
    init_registry()
}

/// Returns true once [`init_registry`] has run.
#[must_use]
pub fn is_initialized() -> bool {
    REGISTRY.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ENTITY_DAMAGED, SOUND_CUE};
    use cinder_bus::EventType;

    #[test]
    fn test_init_is_idempotent() {
        let first = init_registry();
        let second = init_registry();
        assert!(std::ptr::eq(first, second));
        assert!(is_initialized());
        assert!(std::ptr::eq(first, global()));
    }

    #[test]
    fn test_catalog_lookups() {
        let registry = global();
        assert_eq!(registry.event_type("EntityDamaged"), Some(ENTITY_DAMAGED));
        assert_eq!(registry.event_name(SOUND_CUE), Some("SoundCue"));
        assert_eq!(registry.event_type("TICK"), Some(EventType::TICK));
    }
}
