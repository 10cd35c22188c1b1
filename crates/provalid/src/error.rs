//! Engine error types.
//!
//! Two disjoint classes: [`SchemaError`] surfaces at compile/bind time
//! and is fatal; validation failures on well-typed instances are never
//! errors, they are collected as violations. [`ValidateError`] covers
//! the one programmer error possible at validation time: asking for a
//! type the schema does not contain.

use thiserror::Error;

/// A fatal error detected while compiling a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Built-in rules attached to a field of an incompatible kind.
    #[error("{message}.{field}: {rules} rules cannot apply to a {kind} field")]
    RuleTypeMismatch {
        message: String,
        field: String,
        rules: &'static str,
        kind: String,
    },

    /// A `pattern` rule with an invalid regular expression.
    #[error("{message}.{field}: invalid pattern: {source}")]
    InvalidPattern {
        message: String,
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Two rules with the same identifier on one field or message.
    #[error("{message}: {target}: duplicate rule id '{id}'")]
    DuplicateRuleId {
        message: String,
        target: String,
        id: String,
    },

    /// A custom rule whose expression does not parse.
    #[error("{message}: rule '{id}': {detail}")]
    ExpressionParse {
        message: String,
        id: String,
        detail: String,
    },

    /// A custom rule whose expression does not bind (unresolvable
    /// reference, unknown function, non-bool result).
    #[error("{message}: rule '{id}': {detail}")]
    ExpressionBind {
        message: String,
        id: String,
        detail: String,
    },

    /// `unique` requested for repeated message items.
    #[error("{message}.{field}: unique requires scalar or enum items")]
    UniqueOnMessageItems { message: String, field: String },

    /// A field references a message type absent from the schema.
    #[error("{message}.{field}: unknown message type '{name}'")]
    UnknownMessageType {
        message: String,
        field: String,
        name: String,
    },

    /// A field references an enum type absent from the schema.
    #[error("{message}.{field}: unknown enum type '{name}'")]
    UnknownEnumType {
        message: String,
        field: String,
        name: String,
    },
}

/// A programmer error at validation time.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The instance's type is not part of the compiled schema.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}
