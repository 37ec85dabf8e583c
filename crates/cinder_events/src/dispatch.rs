//! # Tick Dispatcher
//!
//! The bus's single consumer. Once per engine tick it drains every ready
//! event, hands each to the handlers registered for its type (in push
//! order), then returns pooled batches to their pools.
//!
//! ```text
//! EventQueue ──consume──> [e0, e1, e2, ...] ──> handlers[e.type] ──> PoolSet::reclaim
//! ```

use std::collections::HashMap;

use cinder_bus::{Event, EventQueue, EventType, PoolSet};

/// A handler for one event type.
pub type Handler = Box<dyn FnMut(&Event) + Send>;

/// Per-tick counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Events delivered to at least one handler.
    pub dispatched: usize,
    /// Events nobody listens to.
    pub unhandled: usize,
    /// Batches returned to their pools.
    pub reclaimed: usize,
}

/// Drains the queue once per tick and routes events to handlers.
pub struct Dispatcher {
    handlers: HashMap<EventType, Vec<Handler>>,
    /// Drain buffer, reused across ticks.
    buffer: Vec<Event>,
    ticks: u64,
}

impl Dispatcher {
    /// Creates a dispatcher whose drain buffer holds `capacity` events
    /// before growing. Match it to the queue capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            handlers: HashMap::new(),
            buffer: Vec::with_capacity(capacity),
            ticks: 0,
        }
    }

    /// Registers a handler. Handlers for the same type run in registration
    /// order.
    pub fn on<F>(&mut self, event_type: EventType, handler: F) -> &mut Self
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Number of handlers registered for `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.handlers.get(&event_type).map_or(0, Vec::len)
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick: drain, dispatch, reclaim.
    pub fn run_tick(&mut self, queue: &EventQueue, pools: &PoolSet) -> TickStats {
        self.ticks += 1;
        let _span = tracing::trace_span!("bus_tick", tick = self.ticks).entered();

        self.buffer.clear();
        queue.consume_into(&mut self.buffer);

        let mut stats = TickStats::default();
        for event in self.buffer.drain(..) {
            if event.event_type.is_tick() {
                // The tick is driven by the scheduler, not the queue.
                tracing::warn!("Tick pseudo-event found in the queue, skipping");
                stats.unhandled += 1;
                continue;
            }

            match self.handlers.get_mut(&event.event_type) {
                Some(handlers) if !handlers.is_empty() => {
                    for handler in handlers.iter_mut() {
                        handler(&event);
                    }
                    stats.dispatched += 1;
                }
                _ => stats.unhandled += 1,
            }

            if pools.reclaim(event) {
                stats.reclaimed += 1;
            }
        }

        if stats.unhandled > 0 {
            tracing::trace!(unhandled = stats.unhandled, "events without handlers");
        }
        stats
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("event_types", &self.handlers.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}
