//! Static types for constraint expressions.
//!
//! `ExprType` describes the type of an expression as seen by the binder.
//! Binding is deliberately loose: `Dyn` stands for "unknown until runtime"
//! and unifies with everything, so only definite mismatches are rejected
//! at schema-load time.

use std::fmt;
use std::sync::Arc;

/// The static type of a constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprType {
    /// Unknown type; unifies with any other type.
    Dyn,
    /// The null literal.
    Null,
    Bool,
    Int,
    UInt,
    Double,
    String,
    Bytes,
    /// `google.protobuf.Timestamp` field values.
    Timestamp,
    /// `google.protobuf.Duration` field values.
    Duration,
    /// Homogeneous list with an element type.
    List(Box<ExprType>),
    /// Map with key and value types.
    Map(Box<ExprType>, Box<ExprType>),
    /// Message-typed value, identified by its fully qualified name.
    Message(Arc<str>),
}

impl ExprType {
    /// Create a list type.
    pub fn list(elem: ExprType) -> Self {
        ExprType::List(Box::new(elem))
    }

    /// Create a map type.
    pub fn map(key: ExprType, value: ExprType) -> Self {
        ExprType::Map(Box::new(key), Box::new(value))
    }

    /// Create a message type from a fully qualified name.
    pub fn message(name: impl Into<Arc<str>>) -> Self {
        ExprType::Message(name.into())
    }

    /// Returns true for the numeric types (int, uint, double).
    pub fn is_numeric(&self) -> bool {
        matches!(self, ExprType::Int | ExprType::UInt | ExprType::Double)
    }

    /// Returns true if a value of this type could be a bool at runtime.
    pub fn maybe_bool(&self) -> bool {
        matches!(self, ExprType::Bool | ExprType::Dyn)
    }

    /// Loose compatibility check used by the binder.
    ///
    /// `Dyn` on either side is compatible with anything; otherwise the
    /// types must agree structurally, with the numeric types considered
    /// mutually comparable.
    pub fn compatible_with(&self, other: &ExprType) -> bool {
        match (self, other) {
            (ExprType::Dyn, _) | (_, ExprType::Dyn) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (ExprType::List(a), ExprType::List(b)) => a.compatible_with(b),
            (ExprType::Map(ka, va), ExprType::Map(kb, vb)) => {
                ka.compatible_with(kb) && va.compatible_with(vb)
            }
            (a, b) => a == b,
        }
    }

    /// Least upper bound of two types: the common type if they agree,
    /// `Dyn` otherwise. Used for list/map literals and ternary arms.
    pub fn lub(&self, other: &ExprType) -> ExprType {
        if self == other {
            self.clone()
        } else {
            ExprType::Dyn
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            ExprType::Dyn => "dyn".into(),
            ExprType::Null => "null_type".into(),
            ExprType::Bool => "bool".into(),
            ExprType::Int => "int".into(),
            ExprType::UInt => "uint".into(),
            ExprType::Double => "double".into(),
            ExprType::String => "string".into(),
            ExprType::Bytes => "bytes".into(),
            ExprType::Timestamp => "google.protobuf.Timestamp".into(),
            ExprType::Duration => "google.protobuf.Duration".into(),
            ExprType::List(elem) => format!("list({})", elem.display_name()),
            ExprType::Map(key, value) => {
                format!("map({}, {})", key.display_name(), value.display_name())
            }
            ExprType::Message(name) => name.to_string(),
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Function overload declaration.
///
/// A function can carry multiple overloads with different parameter lists.
/// The binder resolves calls against these declarations; the evaluator
/// dispatches to the registered implementations by name and arity.
#[derive(Debug, Clone)]
pub struct OverloadDecl {
    /// Unique identifier for this overload (e.g. `size_string`).
    pub id: String,
    /// Parameter types, receiver first for member functions.
    pub params: Vec<ExprType>,
    /// Return type.
    pub result: ExprType,
    /// Whether this is a member function (`receiver.method(args)`).
    pub is_member: bool,
}

impl OverloadDecl {
    /// Create a standalone function overload.
    pub fn function(
        id: impl Into<String>,
        params: Vec<ExprType>,
        result: ExprType,
    ) -> Self {
        Self {
            id: id.into(),
            params,
            result,
            is_member: false,
        }
    }

    /// Create a member function overload. The first parameter is the receiver.
    pub fn method(
        id: impl Into<String>,
        params: Vec<ExprType>,
        result: ExprType,
    ) -> Self {
        Self {
            id: id.into(),
            params,
            result,
            is_member: true,
        }
    }

    /// Argument types, excluding the receiver for member functions.
    pub fn arg_types(&self) -> &[ExprType] {
        if self.is_member && !self.params.is_empty() {
            &self.params[1..]
        } else {
            &self.params
        }
    }
}

/// Function declaration with its overloads.
#[derive(Debug, Clone, Default)]
pub struct FunctionDecl {
    /// The function name.
    pub name: String,
    /// All overloads for this function.
    pub overloads: Vec<OverloadDecl>,
}

impl FunctionDecl {
    /// Create a function declaration with no overloads.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Add an overload (builder pattern).
    pub fn with_overload(mut self, overload: OverloadDecl) -> Self {
        self.overloads.push(overload);
        self
    }

    /// Find overloads matching the given argument count and member-ness.
    pub fn matching(&self, arg_count: usize, is_member: bool) -> Vec<&OverloadDecl> {
        self.overloads
            .iter()
            .filter(|o| o.is_member == is_member && o.arg_types().len() == arg_count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility() {
        assert!(ExprType::Int.compatible_with(&ExprType::Double));
        assert!(ExprType::Dyn.compatible_with(&ExprType::String));
        assert!(!ExprType::String.compatible_with(&ExprType::Int));
        assert!(ExprType::list(ExprType::Int).compatible_with(&ExprType::list(ExprType::Dyn)));
        assert!(!ExprType::list(ExprType::Int).compatible_with(&ExprType::Bytes));
    }

    #[test]
    fn test_lub() {
        assert_eq!(ExprType::Int.lub(&ExprType::Int), ExprType::Int);
        assert_eq!(ExprType::Int.lub(&ExprType::String), ExprType::Dyn);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(ExprType::list(ExprType::Int).display_name(), "list(int)");
        assert_eq!(
            ExprType::map(ExprType::String, ExprType::Dyn).display_name(),
            "map(string, dyn)"
        );
        assert_eq!(ExprType::message("acme.Order").display_name(), "acme.Order");
    }

    #[test]
    fn test_overload_arg_types() {
        let method = OverloadDecl::method(
            "contains_string",
            vec![ExprType::String, ExprType::String],
            ExprType::Bool,
        );
        assert_eq!(method.arg_types(), &[ExprType::String]);

        let func = OverloadDecl::function("size_list", vec![ExprType::list(ExprType::Dyn)], ExprType::Int);
        assert_eq!(func.arg_types().len(), 1);
    }

    #[test]
    fn test_matching_overloads() {
        let decl = FunctionDecl::new("isIp")
            .with_overload(OverloadDecl::method(
                "is_ip",
                vec![ExprType::String],
                ExprType::Bool,
            ))
            .with_overload(OverloadDecl::method(
                "is_ip_version",
                vec![ExprType::String, ExprType::Int],
                ExprType::Bool,
            ));

        assert_eq!(decl.matching(0, true).len(), 1);
        assert_eq!(decl.matching(1, true).len(), 1);
        assert!(decl.matching(2, true).is_empty());
    }
}
