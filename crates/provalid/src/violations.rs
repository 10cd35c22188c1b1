//! Violations and validation results.

use std::fmt;

/// A dotted, indexed path to the field a violation is attached to
/// (`items[2].name`, `attrs["region"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    path: String,
}

impl FieldPath {
    /// The root path (the message under validation).
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with a field name segment.
    pub fn child(&self, field: &str) -> Self {
        let path = if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.path, field)
        };
        Self { path }
    }

    /// Extend with a list index segment.
    pub fn index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{}]", self.path, index),
        }
    }

    /// Extend with a map key segment.
    pub fn key(&self, key: &dyn fmt::Display) -> Self {
        Self {
            path: format!("{}[\"{}\"]", self.path, key),
        }
    }

    /// The rendered path.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// One failed constraint, attached to a field path.
///
/// Produced once during validation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path to the offending field; empty for message-level rules on the
    /// root message.
    pub field_path: String,
    /// Identifier of the failed rule (`string.min_len`, `required`, a
    /// custom rule id).
    pub rule_id: String,
    /// Rendered human-readable message.
    pub message: String,
}

impl Violation {
    /// Create a violation.
    pub fn new(
        field_path: &FieldPath,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.as_str().to_string(),
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_path.is_empty() {
            write!(f, "{}: {}", self.rule_id, self.message)
        } else {
            write!(f, "{}: {}: {}", self.field_path, self.rule_id, self.message)
        }
    }
}

/// The ordered sequence of violations from one validation call.
///
/// An empty sequence means the instance is valid. Created per call,
/// inspected by the caller, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    /// Create an empty (valid) result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the instance passed every rule.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violations in traversal order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Append a violation.
    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Iterate over violations.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }
}

impl IntoIterator for ValidationResult {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}
