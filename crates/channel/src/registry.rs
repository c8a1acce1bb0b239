//! Event handler registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::trace;

type Handler = Arc<dyn Fn(Value) + Send + Sync>;

/// Identifies one registered handler, for targeted removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of inbound event handlers.
///
/// Multiple handlers may subscribe to the same event name; dispatch calls
/// each of them with its own copy of the payload, in registration order.
/// Events with no registered handler are dropped silently.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Mutex<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.lock().expect("registry lock poisoned");
        handlers
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove one handler by id, or all handlers for the event when `id` is None
    pub fn off(&self, event: &str, id: Option<SubscriptionId>) {
        let mut handlers = self.handlers.lock().expect("registry lock poisoned");
        match id {
            Some(id) => {
                if let Some(list) = handlers.get_mut(event) {
                    list.retain(|(hid, _)| *hid != id);
                }
            }
            None => {
                handlers.remove(event);
            }
        }
    }

    /// Invoke every handler registered for `event`
    pub fn dispatch(&self, event: &str, data: Value) {
        let targets: Vec<Handler> = {
            let handlers = self.handlers.lock().expect("registry lock poisoned");
            match handlers.get(event) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => {
                    trace!(event, "no handler registered, event dropped");
                    return;
                }
            }
        };

        for handler in targets {
            handler(data.clone());
        }
    }

    /// Number of handlers registered for an event
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .expect("registry lock poisoned")
            .get(event)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_dispatch_reaches_all_handlers() {
        let registry = EventRegistry::new();
        let hits = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            registry.on("ping", move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        registry.dispatch("ping", json!({}));
        assert_eq!(hits.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_unknown_event_is_dropped() {
        let registry = EventRegistry::new();
        // Nothing registered; must not panic
        registry.dispatch("unknown", json!(null));
    }

    #[test]
    fn test_off_by_id_removes_single_handler() {
        let registry = EventRegistry::new();
        let hits = Arc::new(AtomicU32::new(0));

        let h1 = Arc::clone(&hits);
        let id = registry.on("ping", move |_| {
            h1.fetch_add(1, Ordering::Relaxed);
        });
        let h2 = Arc::clone(&hits);
        registry.on("ping", move |_| {
            h2.fetch_add(10, Ordering::Relaxed);
        });

        registry.off("ping", Some(id));
        registry.dispatch("ping", json!({}));
        assert_eq!(hits.load(Ordering::Relaxed), 10);
        assert_eq!(registry.handler_count("ping"), 1);
    }

    #[test]
    fn test_off_without_id_removes_all() {
        let registry = EventRegistry::new();
        registry.on("ping", |_| {});
        registry.on("ping", |_| {});
        registry.off("ping", None);
        assert_eq!(registry.handler_count("ping"), 0);
    }

    #[test]
    fn test_each_handler_sees_payload() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        registry.on("data", move |value| {
            s.lock().unwrap().push(value);
        });

        registry.dispatch("data", json!({"x": 1}));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["x"], 1);
    }
}
