//! Function registry for expression evaluation.
//!
//! Implementations are stored per function with their arity and
//! member-ness; the evaluator dispatches calls by `(name, arity,
//! is_member)`. Implementations receive already-evaluated argument values
//! (receiver first for member functions) and signal failures by returning
//! error values.

use std::collections::HashMap;
use std::sync::Arc;

use super::Value;

/// A function implementation.
///
/// Receives a slice of already-evaluated argument values (including the
/// receiver for member functions as the first argument).
pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// A function overload with its implementation.
#[derive(Clone)]
pub struct Overload {
    /// The overload ID (e.g. `size_string`).
    pub id: String,
    /// Whether this is a member function (`receiver.method(args)`).
    pub is_member: bool,
    /// The number of parameters (including receiver for member functions).
    pub arity: usize,
    /// The implementation function.
    pub implementation: FunctionImpl,
}

impl Overload {
    /// Create a new overload.
    pub fn new(
        id: impl Into<String>,
        is_member: bool,
        arity: usize,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            id: id.into(),
            is_member,
            arity,
            implementation,
        }
    }

    /// Call this overload with the given arguments.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.implementation)(args)
    }
}

impl std::fmt::Debug for Overload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overload")
            .field("id", &self.id)
            .field("is_member", &self.is_member)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A function with all its overloads.
#[derive(Debug, Clone, Default)]
pub struct Function {
    /// The function name.
    pub name: String,
    /// All overloads for this function.
    pub overloads: Vec<Overload>,
}

impl Function {
    /// Create a new function with no overloads.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Add an overload to this function.
    pub fn with_overload(mut self, overload: Overload) -> Self {
        self.overloads.push(overload);
        self
    }

    /// Find the overload matching the given arity and member-ness.
    pub fn find(&self, arity: usize, is_member: bool) -> Option<&Overload> {
        self.overloads
            .iter()
            .find(|o| o.arity == arity && o.is_member == is_member)
    }
}

/// Registry of all functions available during evaluation.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function with its overloads.
    ///
    /// If a function with the same name exists, the overloads are merged.
    pub fn register(&mut self, function: Function) {
        if let Some(existing) = self.functions.get_mut(&function.name) {
            existing.overloads.extend(function.overloads);
        } else {
            self.functions.insert(function.name.clone(), function);
        }
    }

    /// Get a function by name.
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Check if a function exists.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Find the overload for a call with the given arity and member-ness.
    pub fn find(&self, name: &str, arity: usize, is_member: bool) -> Option<&Overload> {
        self.functions.get(name).and_then(|f| f.find(arity, is_member))
    }

    /// Merge another registry into this one.
    pub fn merge(&mut self, other: FunctionRegistry) {
        for (_, function) in other.functions {
            self.register(function);
        }
    }

    /// Get the number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
