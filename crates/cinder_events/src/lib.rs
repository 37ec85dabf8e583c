//! # CINDER Events
//!
//! The engine's side of the bus: what events exist, how systems emit them,
//! and how the tick loop consumes them.
//!
//! ## Flow
//!
//! ```text
//! gameplay systems (N threads)            main tick (1 thread)
//! ----------------------------            --------------------
//! emit_effect / emit_record  ──┐
//! emit_particles / emit_debris ├──> EventQueue ──> Dispatcher::run_tick
//! decoded script events      ──┘                     └─> handlers, PoolSet::reclaim
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinder_bus::EventQueue;
//! use cinder_events::{catalog, emit, Dispatcher, EmitterPools};
//!
//! let queue = EventQueue::new(4096);
//! let pools = EmitterPools::new();
//! let reclaim = pools.pool_set();
//!
//! let mut dispatcher = Dispatcher::new(queue.capacity());
//! dispatcher.on(catalog::WAVE_CLEARED, |_| println!("wave cleared"));
//!
//! emit::emit_signal(&queue, catalog::WAVE_CLEARED);
//! let stats = dispatcher.run_tick(&queue, &reclaim);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod dispatch;
pub mod emit;
pub mod registry;
pub mod script;

pub use dispatch::{Dispatcher, Handler, TickStats};
pub use emit::{
    emit_damage_numbers, emit_debris, emit_effect, emit_particles, emit_record, emit_signal,
    EmitterPools, EntityEffect,
};
pub use registry::{global, init_registry, is_initialized};
pub use script::{decode_event, decode_script, load_script, EventSpec};
