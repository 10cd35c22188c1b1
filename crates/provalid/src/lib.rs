//! provalid: a protobuf-annotation-driven constraint validation engine.
//!
//! Walks a populated message instance against a constraint-annotated
//! schema and produces an ordered list of violations. Schemas compile
//! once (expressions parse and bind, patterns precompile, rule/kind
//! compatibility is checked), and the compiled schema then validates
//! any number of instances concurrently, as a pure function of
//! (schema, instance).
//!
//! # Quick Start
//!
//! ```
//! use provalid::{compile, MessageValue, SchemaSet};
//! use provalid_schema::{
//!     FieldDescriptor, FieldKind, FieldRules, MessageDescriptor, StringRules,
//! };
//!
//! let schema = SchemaSet::new().with_message(
//!     MessageDescriptor::new("acme.User").with_field(
//!         FieldDescriptor::new("name", 1, FieldKind::String)
//!             .required()
//!             .with_rules(FieldRules::String(Box::new(StringRules {
//!                 min_len: Some(1),
//!                 max_len: Some(64),
//!                 ..Default::default()
//!             }))),
//!     ),
//! );
//!
//! let compiled = compile(schema).unwrap();
//!
//! let valid = MessageValue::new("acme.User").with_field("name", "ada");
//! assert!(compiled.validate(&valid).unwrap().is_valid());
//!
//! let invalid = MessageValue::new("acme.User");
//! let result = compiled.validate(&invalid).unwrap();
//! assert_eq!(result.violations()[0].rule_id, "required");
//! ```
//!
//! # Error classes
//!
//! Schema problems (unresolvable expression references, duplicate rule
//! ids, type-incompatible rules, bad patterns) are [`SchemaError`]s from
//! [`compile`]: fatal, and never seen during validation. Rule failures
//! on well-typed instances are [`Violation`]s collected into a
//! [`ValidationResult`]; validation itself never aborts on them.

mod cache;
mod compile;
mod error;
mod presence;
mod validator;
mod violations;

pub use cache::SchemaCache;
pub use compile::{compile, compile_with_functions, CompiledSchema};
pub use error::{SchemaError, ValidateError};
pub use presence::{resolve, zero_value, PresenceState};
pub use violations::{FieldPath, ValidationResult, Violation};

// The instance value model and schema descriptors, re-exported so most
// callers need only this crate.
pub use provalid_cel::{Duration, FunctionRegistry, MapKey, MessageValue, Timestamp, Value};
pub use provalid_schema::SchemaSet;
