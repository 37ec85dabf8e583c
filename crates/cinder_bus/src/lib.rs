//! # CINDER Bus
//!
//! The in-process event bus at the center of the CINDER tick loop.
//!
//! - Any number of gameplay systems push events concurrently
//! - Once per tick, the engine drains every ready event and dispatches it
//! - Bulk events carry pooled batches instead of fresh allocations
//! - Scripts refer to events by name; the registry turns names into payloads
//!
//! ## Architecture Rules
//!
//! 1. **Producers never block** - a full queue evicts its oldest events
//! 2. **No locks in the queue** - atomics on two counters and per-slot state
//! 3. **No allocation after warm-up** - pools recycle batch storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinder_bus::{Event, EventQueue, EventType};
//!
//! const SHIELD_DOWN: EventType = EventType::new(12);
//!
//! let queue = EventQueue::new(4096);
//! queue.push(Event::signal(SHIELD_DOWN));
//!
//! for event in queue.consume() {
//!     // dispatch by event.event_type
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod event;
pub mod pool;
pub mod queue;
pub mod registry;

pub use config::{BusConfig, PoolConfig, QueueConfig};
pub use error::{BusError, BusResult};
pub use event::{Event, EventType, Payload};
pub use pool::{emit_batch, Batch, BatchPool, PoolSet};
pub use queue::EventQueue;
pub use registry::{EventRegistry, FieldKind, FieldValue, PayloadRecord, TICK_NAME};
