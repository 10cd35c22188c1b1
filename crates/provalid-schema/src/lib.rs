//! provalid-schema: schema model and constraint rule sets.
//!
//! The in-memory representation of constraint-annotated schemas:
//! message, field, enum, and oneof descriptors ([`descriptor`]) and the
//! typed built-in rule sets attached to them ([`rules`]). Descriptors
//! are produced by an external schema loader, assembled into a
//! [`SchemaSet`], and handed to the engine for compilation; they are
//! immutable after assembly.
//!
//! The schema set implements the expression binder's field-type
//! provider, so message-level rules can resolve `this.some_field`
//! against the declared fields.

pub mod descriptor;
pub mod rules;

pub use descriptor::{
    EnumDescriptor, FieldDescriptor, FieldKind, MapKeyKind, MessageDescriptor, OneofDescriptor,
    Presence, SchemaSet,
};
pub use rules::{
    AnyRules, BoolRules, BytesRules, DoubleRules, DurationRules, EnumRules, FieldRules, Ignore,
    MapRules, NumRules, RepeatedRules, Rule, StringFormat, StringRules, TimestampRules,
};
