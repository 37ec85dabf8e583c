//! # Pool Set
//!
//! Routes consumed batch payloads back to the pool that owns them, keyed by
//! event type. The tick consumer does not know entry shapes statically; the
//! set does the downcast on its behalf.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::event::{Event, EventType, Payload};
use crate::pool::{Batch, BatchPool};

/// Type-erased release into a [`BatchPool`].
trait Reclaim: Send + Sync {
    /// Hands the payload back if it is not this pool's shape.
    fn reclaim(&self, batch: Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>>;
}

impl<T: Send + 'static> Reclaim for BatchPool<T> {
    fn reclaim(&self, batch: Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>> {
        let batch = batch.downcast::<Batch<T>>()?;
        self.release(Some(batch));
        Ok(())
    }
}

/// Event type → owning pool.
#[derive(Default)]
pub struct PoolSet {
    pools: HashMap<EventType, Arc<dyn Reclaim>>,
}

impl PoolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that batches carried by `event_type` belong to `pool`.
    ///
    /// Binding the same type again replaces the previous pool.
    pub fn bind<T: Send + 'static>(&mut self, event_type: EventType, pool: Arc<BatchPool<T>>) {
        self.pools.insert(event_type, pool);
    }

    /// Returns true if `event_type` has a pool bound.
    #[must_use]
    pub fn is_bound(&self, event_type: EventType) -> bool {
        self.pools.contains_key(&event_type)
    }

    /// Number of bound event types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Consumes a processed event, returning its batch to the owning pool.
    ///
    /// Returns true if a batch went back to a pool. Non-batch payloads are
    /// simply dropped. A batch with no bound pool, or of the wrong shape for
    /// the bound pool, is dropped with a warning.
    pub fn reclaim(&self, event: Event) -> bool {
        let Payload::Batch(batch) = event.payload else {
            return false;
        };

        let Some(pool) = self.pools.get(&event.event_type) else {
            tracing::warn!(event_type = event.event_type.raw(), "batch event has no pool bound, dropping");
            return false;
        };

        if pool.reclaim(batch).is_err() {
            tracing::warn!(
                event_type = event.event_type.raw(),
                "batch shape does not match bound pool, dropping"
            );
            return false;
        }
        true
    }
}

impl std::fmt::Debug for PoolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bound: Vec<_> = self.pools.keys().map(|t| t.raw()).collect();
        bound.sort_unstable();
        f.debug_struct("PoolSet").field("bound", &bound).finish()
    }
}
