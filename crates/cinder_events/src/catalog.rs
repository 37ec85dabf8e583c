//! # Event Catalog
//!
//! Every event the engine's gameplay systems exchange, with the payload
//! each one carries.
//!
//! ```text
//! Type  Name               Payload
//! ----  -----------------  ----------------------------------
//!   0   Tick               (scheduler pseudo-event, never queued)
//!   1   EntitySpawned      record  EntitySpawned
//!   2   EntityDamaged      record  EntityDamaged
//!   3   EntityDied         record  EntityDied
//!   4   StatusEffect       scalar  EntityEffect (bit-packed)
//!   5   HitFlash           scalar  EntityEffect (bit-packed)
//!   6   WaveCleared        signal
//!   7   SoundCue           record  SoundCue
//!   8   ParticleBurst      batch   ParticleSpawn
//!   9   DebrisBurst        batch   DebrisSpawn
//!  10   DamageNumbers      batch   DamageNumber
//! ```

use bytemuck::{Pod, Zeroable};
use cinder_bus::{EventRegistry, EventType};

// =============================================================================
// Event types
// =============================================================================

/// An entity entered the world.
pub const ENTITY_SPAWNED: EventType = EventType::new(1);
/// An entity took damage.
pub const ENTITY_DAMAGED: EventType = EventType::new(2);
/// An entity died.
pub const ENTITY_DIED: EventType = EventType::new(3);
/// A status effect was applied (packed scalar).
pub const STATUS_EFFECT: EventType = EventType::new(4);
/// Flash an entity's material on hit (packed scalar).
pub const HIT_FLASH: EventType = EventType::new(5);
/// The current enemy wave is cleared.
pub const WAVE_CLEARED: EventType = EventType::new(6);
/// Play a sound cue.
pub const SOUND_CUE: EventType = EventType::new(7);
/// Spawn a burst of particles.
pub const PARTICLE_BURST: EventType = EventType::new(8);
/// Spawn a burst of physics debris.
pub const DEBRIS_BURST: EventType = EventType::new(9);
/// Pop floating damage numbers.
pub const DAMAGE_NUMBERS: EventType = EventType::new(10);

// =============================================================================
// Record payloads
// =============================================================================

cinder_bus::payload_record! {
    /// Payload of [`ENTITY_SPAWNED`].
    pub struct EntitySpawned {
        /// New entity.
        pub entity: u32,
        /// Archetype / prefab id.
        pub kind: u16,
        /// Spawn position X.
        pub x: f32,
        /// Spawn position Y.
        pub y: f32,
        /// Spawn position Z.
        pub z: f32,
    }
}

cinder_bus::payload_record! {
    /// Payload of [`ENTITY_DAMAGED`].
    pub struct EntityDamaged {
        /// Entity that took damage.
        pub entity: u32,
        /// Entity that dealt it (0 = environment).
        pub source: u32,
        /// Hit points removed.
        pub amount: u32,
        /// Was it a critical hit?
        pub critical: bool,
    }
}

cinder_bus::payload_record! {
    /// Payload of [`ENTITY_DIED`].
    pub struct EntityDied {
        /// Entity that died.
        pub entity: u32,
        /// Entity that caused the death (0 = environment).
        pub killer: u32,
    }
}

cinder_bus::payload_record! {
    /// Payload of [`SOUND_CUE`].
    pub struct SoundCue {
        /// Cue name in the audio bank.
        pub cue: String,
        /// Linear volume, 0.0 - 1.0.
        pub volume: f32,
        /// Entity the sound is attached to (0 = listener).
        pub emitter: u32,
    }
}

// =============================================================================
// Batch entries
// =============================================================================

/// One particle to spawn. Entry of [`PARTICLE_BURST`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleSpawn {
    /// Position (xyz) + lifetime in seconds (w).
    pub position_lifetime: [f32; 4],
    /// Velocity (xyz) + size (w).
    pub velocity_size: [f32; 4],
    /// Color (rgba).
    pub color: [f32; 4],
}

/// One debris chunk to spawn. Entry of [`DEBRIS_BURST`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DebrisSpawn {
    /// Position.
    pub position: [f32; 3],
    /// Material id of the chunk.
    pub material: u32,
    /// Initial impulse.
    pub impulse: [f32; 3],
    /// Mass in kilograms.
    pub mass: f32,
}

/// One floating damage number. Entry of [`DAMAGE_NUMBERS`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DamageNumber {
    /// Entity the number floats above.
    pub entity: u32,
    /// Amount shown.
    pub amount: u32,
    /// 1 for a critical hit, 0 otherwise.
    pub critical: u32,
    /// Padding to 16 bytes.
    pub _pad: u32,
}

impl DamageNumber {
    /// Creates a damage number.
    #[must_use]
    pub const fn new(entity: u32, amount: u32, critical: bool) -> Self {
        Self {
            entity,
            amount,
            critical: critical as u32,
            _pad: 0,
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Registers every catalog event, name and payload shape.
pub fn register_catalog(registry: &mut EventRegistry) {
    registry.register_type("EntitySpawned", ENTITY_SPAWNED, Some(&EntitySpawned::default()));
    registry.register_type("EntityDamaged", ENTITY_DAMAGED, Some(&EntityDamaged::default()));
    registry.register_type("EntityDied", ENTITY_DIED, Some(&EntityDied::default()));
    registry.register_type("StatusEffect", STATUS_EFFECT, None);
    registry.register_type("HitFlash", HIT_FLASH, None);
    registry.register_type("WaveCleared", WAVE_CLEARED, None);
    registry.register_type("SoundCue", SOUND_CUE, Some(&SoundCue::default()));
    registry.register_type("ParticleBurst", PARTICLE_BURST, None);
    registry.register_type("DebrisBurst", DEBRIS_BURST, None);
    registry.register_type("DamageNumbers", DAMAGE_NUMBERS, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_bus::PayloadRecord;

    #[test]
    fn test_entry_sizes() {
        assert_eq!(std::mem::size_of::<ParticleSpawn>(), 48);
        assert_eq!(std::mem::size_of::<DebrisSpawn>(), 32);
        assert_eq!(std::mem::size_of::<DamageNumber>(), 16);
    }

    #[test]
    fn test_catalog_round_trip() {
        let mut registry = EventRegistry::new();
        register_catalog(&mut registry);
        assert_eq!(registry.len(), 10);

        let names: Vec<String> = registry.names().map(str::to_string).collect();
        for name in &names {
            let ty = registry.event_type(name).unwrap();
            assert_eq!(registry.event_name(ty), Some(name.as_str()));
        }
    }

    #[test]
    fn test_catalog_shapes() {
        let mut registry = EventRegistry::new();
        register_catalog(&mut registry);

        let record = registry.new_payload(ENTITY_DAMAGED).unwrap();
        assert_eq!(record.type_name(), "EntityDamaged");
        assert_eq!(
            record.as_any().downcast_ref::<EntityDamaged>(),
            Some(&EntityDamaged::default())
        );

        for signal in [STATUS_EFFECT, WAVE_CLEARED, PARTICLE_BURST] {
            assert!(registry.new_payload(signal).is_none());
        }
    }

    #[test]
    fn test_damage_number_flag() {
        assert_eq!(DamageNumber::new(1, 50, true).critical, 1);
        assert_eq!(DamageNumber::new(1, 50, false).critical, 0);
    }
}
