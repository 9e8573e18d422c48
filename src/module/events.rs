//! Lifecycle event notification
//!
//! Explicit listener registration: an ordered list of subscriber functions
//! invoked synchronously from the orchestration phases. The only cross-phase
//! ordering guarantee is the phase ordering itself.

use tracing::debug;

use crate::module::identity::ModuleId;

/// Lifecycle notifications surfaced to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Mounted(ModuleId),
    Initialized(ModuleId),
    Unmounted(ModuleId),
    Deinitialized(ModuleId),
}

/// A host-registered lifecycle subscriber.
pub type LifecycleListener = Box<dyn FnMut(&LifecycleEvent) + Send>;

/// Ordered list of synchronously-invoked lifecycle subscribers.
#[derive(Default)]
pub struct EventListeners {
    listeners: Vec<LifecycleListener>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber; listeners run in registration order.
    pub fn subscribe(&mut self, listener: LifecycleListener) {
        self.listeners.push(listener);
    }

    /// Deliver an event to every subscriber, in order.
    pub fn emit(&mut self, event: &LifecycleEvent) {
        debug!("Emitting lifecycle event: {:?}", event);
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn listeners_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = EventListeners::new();

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            listeners.subscribe(Box::new(move |event| {
                seen.lock().unwrap().push(format!("{}:{:?}", tag, event));
            }));
        }

        listeners.emit(&LifecycleEvent::Mounted(ModuleId::parse("demo.greeter")));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("first:"));
        assert!(seen[1].starts_with("second:"));
    }
}
