//! # Batch Pools
//!
//! Recycled payload containers for high-volume events.
//!
//! ## Design Philosophy
//!
//! One explosion produces hundreds of particle spawns. Sending them as one
//! event with a `Vec` would allocate on every explosion; sending them as
//! hundreds of events would flood the queue. Instead:
//!
//! - One event carries a [`Batch<T>`] of entries
//! - The batch comes from a [`BatchPool<T>`] and goes back after processing
//! - Backing storage is kept, so after warm-up nothing allocates

mod batch;
mod set;

pub use batch::{emit_batch, Batch, BatchPool};
pub use set::PoolSet;
