//! Variable bindings for expression evaluation.
//!
//! An `Activation` resolves variable names to values during evaluation.
//! Constraint expressions bind at most two names (`this` and `now`), but
//! the trait keeps the evaluator decoupled from how bindings are stored.

use std::collections::HashMap;

use super::Value;

/// Trait for resolving variable bindings during evaluation.
pub trait Activation: Send + Sync {
    /// Resolve a variable name to its value.
    ///
    /// Returns `None` if the variable is not bound.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// A simple activation backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapActivation {
    bindings: HashMap<String, Value>,
}

impl MapActivation {
    /// Create a new empty activation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Add a binding (builder pattern).
    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

/// An empty activation with no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl<T: Activation + ?Sized> Activation for &T {
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_activation() {
        let mut activation = MapActivation::new();
        activation.insert("this", 42i64);

        assert_eq!(activation.resolve("this"), Some(Value::Int(42)));
        assert_eq!(activation.resolve("now"), None);
    }

    #[test]
    fn test_builder() {
        let activation = MapActivation::new()
            .with_binding("this", "hello")
            .with_binding("now", Value::timestamp(100, 0));

        assert_eq!(activation.resolve("this"), Some(Value::from("hello")));
        assert!(activation.resolve("now").is_some());
    }

    #[test]
    fn test_empty_activation() {
        assert_eq!(EmptyActivation.resolve("anything"), None);
    }
}
