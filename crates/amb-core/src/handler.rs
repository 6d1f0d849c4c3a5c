//! Handler trait and the name-keyed handler table

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

/// Callback invoked with the decoded `message` of a routed envelope
///
/// Any `Fn(JsonValue) + Send + Sync` closure is a handler. Return values
/// are never consulted.
pub trait Handler: Send + Sync {
    fn handle(&self, message: JsonValue);
}

impl<F> Handler for F
where
    F: Fn(JsonValue) + Send + Sync,
{
    fn handle(&self, message: JsonValue) {
        self(message)
    }
}

/// Registered handlers indexed by message name
///
/// One handler per name; registering again replaces the old one.
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler
    ///
    /// Returns `true` if a handler for `name` already existed and was replaced.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> bool {
        self.handlers.insert(name.into(), handler).is_some()
    }

    /// Get the handler for a name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a name has a handler
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Get the number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get all registered names
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_register_and_get() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut table = HandlerTable::new();
        assert!(table.is_empty());
        let replaced = table.register(
            "greet",
            Arc::new(move |msg: JsonValue| sink.lock().unwrap().push(msg)),
        );
        assert!(!replaced);
        assert_eq!(table.len(), 1);
        assert!(table.contains("greet"));

        table.get("greet").unwrap().handle(JsonValue::from("hello"));
        assert_eq!(*seen.lock().unwrap(), vec![JsonValue::from("hello")]);
        assert!(table.get("other").is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let first = hits.clone();
        let second = hits.clone();

        let mut table = HandlerTable::new();
        table.register(
            "n",
            Arc::new(move |_: JsonValue| first.lock().unwrap().push("first")),
        );
        let replaced = table.register(
            "n",
            Arc::new(move |_: JsonValue| second.lock().unwrap().push("second")),
        );

        assert!(replaced);
        assert_eq!(table.len(), 1);
        table.get("n").unwrap().handle(JsonValue::Null);
        assert_eq!(*hits.lock().unwrap(), vec!["second"]);
    }
}
