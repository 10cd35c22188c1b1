//! Compiled-schema cache.
//!
//! Compilation (parsing and binding every rule expression) happens once
//! per schema version; the compiled schema is immutable and shared via
//! `Arc` across arbitrarily many parallel validation calls. The cache is
//! a concurrent map keyed by schema identity, so concurrent callers do
//! not race into duplicate compilations of the same key.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use provalid_schema::SchemaSet;

use crate::compile::{compile, CompiledSchema};
use crate::error::SchemaError;

/// A concurrent cache of compiled schemas keyed by schema identity
/// (e.g. a registry name plus version).
#[derive(Debug, Default)]
pub struct SchemaCache {
    inner: DashMap<String, Arc<CompiledSchema>>,
}

impl SchemaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled schema for `key`, compiling `schema` on a miss.
    ///
    /// The entry lock is held across compilation, so a racing caller
    /// waits for the winner's result instead of compiling again.
    pub fn get_or_compile(
        &self,
        key: impl Into<String>,
        schema: &SchemaSet,
    ) -> Result<Arc<CompiledSchema>, SchemaError> {
        match self.inner.entry(key.into()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let compiled = Arc::new(compile(schema.clone())?);
                entry.insert(compiled.clone());
                Ok(compiled)
            }
        }
    }

    /// Look up a compiled schema without compiling.
    pub fn get(&self, key: &str) -> Option<Arc<CompiledSchema>> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Drop a cached schema (e.g. when a schema version is retired).
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provalid_schema::{FieldDescriptor, FieldKind, MessageDescriptor};

    fn sample_schema() -> SchemaSet {
        SchemaSet::new().with_message(
            MessageDescriptor::new("acme.User")
                .with_field(FieldDescriptor::new("name", 1, FieldKind::String)),
        )
    }

    #[test]
    fn get_or_compile_reuses_the_compiled_schema() {
        let cache = SchemaCache::new();
        let schema = sample_schema();

        let first = cache.get_or_compile("acme/v1", &schema).unwrap();
        let second = cache.get_or_compile("acme/v1", &schema).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_compile_separately() {
        let cache = SchemaCache::new();
        let schema = sample_schema();

        let v1 = cache.get_or_compile("acme/v1", &schema).unwrap();
        let v2 = cache.get_or_compile("acme/v2", &schema).unwrap();
        assert!(!Arc::ptr_eq(&v1, &v2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let cache = SchemaCache::new();
        cache.get_or_compile("acme/v1", &sample_schema()).unwrap();

        assert!(cache.invalidate("acme/v1"));
        assert!(!cache.invalidate("acme/v1"));
        assert!(cache.get("acme/v1").is_none());
    }

    #[test]
    fn compile_errors_are_not_cached() {
        let cache = SchemaCache::new();
        let broken = SchemaSet::new().with_message(
            MessageDescriptor::new("acme.Broken").with_field(FieldDescriptor::new(
                "nested",
                1,
                FieldKind::Message(std::sync::Arc::from("acme.Missing")),
            )),
        );

        assert!(cache.get_or_compile("broken", &broken).is_err());
        assert!(cache.get("broken").is_none());

        // A corrected schema under the same key compiles
        assert!(cache.get_or_compile("broken", &sample_schema()).is_ok());
    }
}
