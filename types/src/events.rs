//! Synchronous fan-out event bus.
//!
//! Observable events exist for external indexing (cap-table, order book,
//! redemption modules), never for internal control flow. Listeners are
//! invoked inline on the emitting call; keep handlers fast.

/// A synchronous fan-out bus over one event type.
pub struct EventBus<E> {
    listeners: Vec<Box<dyn Fn(&E) + Send + Sync>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener; it will see every subsequently emitted event.
    pub fn subscribe(&mut self, listener: impl Fn(&E) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver an event to every listener, in subscription order.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
