//! Listener registration and event fan-out.

use std::sync::{Arc, Weak};

use atorch_packet::{Frame, PacketError, Reading};
use parking_lot::Mutex;

/// Events emitted by [`crate::AtorchService`].
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// The transport connected (`true`) or dropped (`false`).
    Connected(bool),
    /// A report was decoded.
    Packet(Reading),
    /// A frame was reassembled but could not be decoded.
    Wrong {
        /// The offending frame.
        frame: Frame,
        /// Why it was rejected.
        error: PacketError,
    },
}

type Listener = Arc<dyn Fn(&ServiceEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// A set of listeners that all receive every emitted event.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Arc<Mutex<Registry>>,
}

impl EventHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is used to remove it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ServiceEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every listener.
    ///
    /// The registry lock is released before listeners run, so a listener may
    /// subscribe or unsubscribe from inside its callback.
    pub fn emit(&self, event: &ServiceEvent) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle that removes one listener from its hub.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the listener. Does nothing if the hub is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
