//! # Emission Helpers
//!
//! How gameplay systems put events on the bus.
//!
//! - **Bit-packed scalars** for the highest-frequency single-entity events:
//!   entity id, effect code and magnitude fit in one `u64`, so the push
//!   never touches the heap.
//! - **Pooled bursts** for bulk spawns: one event per explosion, with the
//!   entries copied into a recycled batch.
//! - Plain signal and record pushes for everything else.

use std::sync::Arc;

use cinder_bus::{
    emit_batch, BatchPool, BusConfig, Event, EventQueue, EventType, PayloadRecord, PoolSet,
};

use crate::catalog::{
    DamageNumber, DebrisSpawn, ParticleSpawn, DAMAGE_NUMBERS, DEBRIS_BURST, PARTICLE_BURST,
};

/// An `(entity, effect, magnitude)` triple packed into one machine word.
///
/// ```text
/// bits 63..48   47..32   31..0
///      magnitude effect  entity
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntityEffect {
    /// Target entity.
    pub entity: u32,
    /// Effect code (status id, flash palette, ...).
    pub effect: u16,
    /// Strength / stack count / duration in ticks, meaning depends on effect.
    pub magnitude: u16,
}

impl EntityEffect {
    /// Creates an effect.
    #[inline]
    #[must_use]
    pub const fn new(entity: u32, effect: u16, magnitude: u16) -> Self {
        Self {
            entity,
            effect,
            magnitude,
        }
    }

    /// Packs into a scalar payload.
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u64 {
        ((self.magnitude as u64) << 48) | ((self.effect as u64) << 32) | (self.entity as u64)
    }

    /// Unpacks a scalar payload.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(packed: u64) -> Self {
        Self {
            entity: packed as u32,
            effect: (packed >> 32) as u16,
            magnitude: (packed >> 48) as u16,
        }
    }
}

/// Pushes a bit-packed effect. Zero heap allocation.
#[inline]
pub fn emit_effect(queue: &EventQueue, event_type: EventType, effect: EntityEffect) {
    queue.push(Event::scalar(event_type, effect.pack()));
}

/// Pushes a payload-less signal.
#[inline]
pub fn emit_signal(queue: &EventQueue, event_type: EventType) {
    queue.push(Event::signal(event_type));
}

/// Pushes a record payload.
pub fn emit_record<R: PayloadRecord>(queue: &EventQueue, event_type: EventType, record: R) {
    queue.push(Event::record(event_type, record));
}

/// Default peak entries per particle burst.
const PARTICLE_ENTRY_CAPACITY: usize = 512;
/// Default peak entries per debris burst.
const DEBRIS_ENTRY_CAPACITY: usize = 128;
/// Default peak entries per damage-number batch.
const DAMAGE_NUMBER_ENTRY_CAPACITY: usize = 64;

/// One batch pool per burst kind in the catalog.
#[derive(Clone, Debug)]
pub struct EmitterPools {
    /// Pool for [`PARTICLE_BURST`].
    pub particles: Arc<BatchPool<ParticleSpawn>>,
    /// Pool for [`DEBRIS_BURST`].
    pub debris: Arc<BatchPool<DebrisSpawn>>,
    /// Pool for [`DAMAGE_NUMBERS`].
    pub damage_numbers: Arc<BatchPool<DamageNumber>>,
}

impl EmitterPools {
    /// Creates pools with the built-in sizes and no prewarm.
    #[must_use]
    pub fn new() -> Self {
        Self {
            particles: Arc::new(BatchPool::new(PARTICLE_ENTRY_CAPACITY)),
            debris: Arc::new(BatchPool::new(DEBRIS_ENTRY_CAPACITY)),
            damage_numbers: Arc::new(BatchPool::new(DAMAGE_NUMBER_ENTRY_CAPACITY)),
        }
    }

    /// Creates pools sized by configuration, falling back to the built-in
    /// sizes for kinds the config does not mention.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        for pool in &config.pools {
            if !matches!(pool.event.as_str(), "ParticleBurst" | "DebrisBurst" | "DamageNumbers") {
                tracing::warn!(event = %pool.event, "pool configured for an event with no batch payload");
            }
        }

        Self {
            particles: Arc::new(Self::pool(config, "ParticleBurst", PARTICLE_ENTRY_CAPACITY)),
            debris: Arc::new(Self::pool(config, "DebrisBurst", DEBRIS_ENTRY_CAPACITY)),
            damage_numbers: Arc::new(Self::pool(
                config,
                "DamageNumbers",
                DAMAGE_NUMBER_ENTRY_CAPACITY,
            )),
        }
    }

    fn pool<T>(config: &BusConfig, event: &str, default_capacity: usize) -> BatchPool<T> {
        config
            .pool(event)
            .map_or_else(|| BatchPool::new(default_capacity), BatchPool::from_config)
    }

    /// Binds each pool to its event type, for the tick consumer's reclaim.
    #[must_use]
    pub fn pool_set(&self) -> PoolSet {
        let mut set = PoolSet::new();
        set.bind(PARTICLE_BURST, Arc::clone(&self.particles));
        set.bind(DEBRIS_BURST, Arc::clone(&self.debris));
        set.bind(DAMAGE_NUMBERS, Arc::clone(&self.damage_numbers));
        set
    }
}

impl Default for EmitterPools {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits one [`PARTICLE_BURST`] carrying every particle. No-op when empty.
pub fn emit_particles(queue: &EventQueue, pools: &EmitterPools, particles: &[ParticleSpawn]) -> bool {
    emit_batch(queue, &pools.particles, PARTICLE_BURST, particles)
}

/// Emits one [`DEBRIS_BURST`]. No-op when empty.
pub fn emit_debris(queue: &EventQueue, pools: &EmitterPools, debris: &[DebrisSpawn]) -> bool {
    emit_batch(queue, &pools.debris, DEBRIS_BURST, debris)
}

/// Emits one [`DAMAGE_NUMBERS`] batch. No-op when empty.
pub fn emit_damage_numbers(
    queue: &EventQueue,
    pools: &EmitterPools,
    numbers: &[DamageNumber],
) -> bool {
    emit_batch(queue, &pools.damage_numbers, DAMAGE_NUMBERS, numbers)
}
