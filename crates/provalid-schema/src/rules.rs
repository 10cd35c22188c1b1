//! Constraint rule sets.
//!
//! Each field kind owns a closed set of built-in rule kinds. Rule structs
//! are plain data with `Default` impls; unset options mean "rule not
//! present". The engine checks rule/kind compatibility and evaluates the
//! rules; this crate only describes them.

use provalid_cel::{Duration, Timestamp};

/// Ignore annotation: short-circuits every rule on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ignore {
    /// No ignore behavior.
    #[default]
    Unspecified,
    /// Skip all rules when the field holds its zero value.
    IfZeroValue,
    /// Skip all rules unconditionally.
    Always,
}

/// A custom expression rule attached to a field or message.
///
/// Identifiers must be unique within one field's or message's rule set;
/// the engine rejects duplicates at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule identifier, reported in violations.
    pub id: String,
    /// Human-readable message reported when the rule fails.
    pub message: String,
    /// Expression source; must evaluate to bool.
    pub expression: String,
}

impl Rule {
    /// Create a custom rule.
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            expression: expression.into(),
        }
    }
}

/// Built-in typed rules, one variant per field kind family.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldRules {
    /// No built-in rules.
    #[default]
    None,
    Bool(BoolRules),
    Int(NumRules<i64>),
    UInt(NumRules<u64>),
    Double(DoubleRules),
    String(Box<StringRules>),
    Bytes(BytesRules),
    Enum(EnumRules),
    Repeated(Box<RepeatedRules>),
    Map(Box<MapRules>),
    Timestamp(TimestampRules),
    Duration(DurationRules),
    Any(AnyRules),
}

/// Rules for bool fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoolRules {
    /// The value must equal this constant.
    pub constant: Option<bool>,
}

/// The shared shape of numeric rules, instantiated per numeric kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumRules<T> {
    /// The value must equal this constant.
    pub constant: Option<T>,
    /// Exclusive upper bound.
    pub lt: Option<T>,
    /// Inclusive upper bound.
    pub lte: Option<T>,
    /// Exclusive lower bound.
    pub gt: Option<T>,
    /// Inclusive lower bound.
    pub gte: Option<T>,
    /// The value must be one of these.
    pub in_list: Vec<T>,
    /// The value must not be one of these.
    pub not_in: Vec<T>,
}

/// Rules for float and double fields: the numeric shape plus `finite`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoubleRules {
    /// The shared numeric rules.
    pub num: NumRules<f64>,
    /// Reject NaN and positive/negative infinity.
    pub finite: bool,
}

/// Well-known string format predicates. At most one per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Hostname,
    Ip,
    Ipv4,
    Ipv6,
    Uri,
    UriRef,
    Uuid,
    /// Hostname or IP address.
    Address,
    /// `host:port` pair; `port_required` rejects a bare host.
    HostAndPort { port_required: bool },
}

/// Rules for string fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringRules {
    /// The value must equal this constant.
    pub constant: Option<String>,
    /// Exact length in Unicode code points.
    pub len: Option<u64>,
    /// Minimum length in Unicode code points.
    pub min_len: Option<u64>,
    /// Maximum length in Unicode code points.
    pub max_len: Option<u64>,
    /// Exact length in bytes.
    pub len_bytes: Option<u64>,
    /// Minimum length in bytes.
    pub min_bytes: Option<u64>,
    /// Maximum length in bytes.
    pub max_bytes: Option<u64>,
    /// The value must match this regular expression.
    pub pattern: Option<String>,
    /// The value must start with this prefix.
    pub prefix: Option<String>,
    /// The value must end with this suffix.
    pub suffix: Option<String>,
    /// The value must contain this substring.
    pub contains: Option<String>,
    /// The value must not contain this substring.
    pub not_contains: Option<String>,
    /// The value must be one of these.
    pub in_list: Vec<String>,
    /// The value must not be one of these.
    pub not_in: Vec<String>,
    /// Well-known format predicate.
    pub format: Option<StringFormat>,
}

/// Rules for bytes fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BytesRules {
    /// The value must equal this constant.
    pub constant: Option<Vec<u8>>,
    /// Exact length in bytes.
    pub len: Option<u64>,
    /// Minimum length in bytes.
    pub min_len: Option<u64>,
    /// Maximum length in bytes.
    pub max_len: Option<u64>,
    /// The lossy UTF-8 decoding must match this regular expression.
    pub pattern: Option<String>,
    /// The value must start with this prefix.
    pub prefix: Option<Vec<u8>>,
    /// The value must end with this suffix.
    pub suffix: Option<Vec<u8>>,
    /// The value must contain this subsequence.
    pub contains: Option<Vec<u8>>,
    /// The value must be one of these.
    pub in_list: Vec<Vec<u8>>,
    /// The value must not be one of these.
    pub not_in: Vec<Vec<u8>>,
}

/// Rules for enum fields.
///
/// The canonical required-and-meaningful check is `defined_only` together
/// with `not_in: vec![0]`; `defined_only` alone accepts the zero
/// enumerant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumRules {
    /// The value must equal this constant.
    pub constant: Option<i32>,
    /// The value must match a declared enumerant.
    pub defined_only: bool,
    /// The value must be one of these numbers.
    pub in_list: Vec<i32>,
    /// The value must not be one of these numbers.
    pub not_in: Vec<i32>,
}

/// Rules for repeated fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepeatedRules {
    /// Minimum item count.
    pub min_items: Option<u64>,
    /// Maximum item count.
    pub max_items: Option<u64>,
    /// All items must be distinct. Scalar and enum items only.
    pub unique: bool,
    /// Rules applied to every item.
    pub items: Option<FieldRules>,
}

/// Rules for map fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapRules {
    /// Minimum pair count.
    pub min_pairs: Option<u64>,
    /// Maximum pair count.
    pub max_pairs: Option<u64>,
    /// Rules applied to every key.
    pub keys: Option<FieldRules>,
    /// Rules applied to every value.
    pub values: Option<FieldRules>,
}

/// Rules for timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimestampRules {
    /// The value must equal this constant.
    pub constant: Option<Timestamp>,
    /// Exclusive upper bound.
    pub lt: Option<Timestamp>,
    /// Inclusive upper bound.
    pub lte: Option<Timestamp>,
    /// Exclusive lower bound.
    pub gt: Option<Timestamp>,
    /// Inclusive lower bound.
    pub gte: Option<Timestamp>,
    /// The value must be earlier than the evaluation time.
    pub lt_now: bool,
    /// The value must be later than the evaluation time.
    pub gt_now: bool,
    /// The value must be within this duration of the evaluation time.
    pub within: Option<Duration>,
}

/// Rules for duration fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DurationRules {
    /// The value must equal this constant.
    pub constant: Option<Duration>,
    /// Exclusive upper bound.
    pub lt: Option<Duration>,
    /// Inclusive upper bound.
    pub lte: Option<Duration>,
    /// Exclusive lower bound.
    pub gt: Option<Duration>,
    /// Inclusive lower bound.
    pub gte: Option<Duration>,
    /// The value must be one of these.
    pub in_list: Vec<Duration>,
    /// The value must not be one of these.
    pub not_in: Vec<Duration>,
}

/// Rules for `google.protobuf.Any` fields, over type URLs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnyRules {
    /// The type URL must be one of these.
    pub in_list: Vec<String>,
    /// The type URL must not be one of these.
    pub not_in: Vec<String>,
}

impl FieldRules {
    /// Whether no rule is present in this set.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldRules::None => true,
            FieldRules::Bool(r) => r.constant.is_none(),
            FieldRules::Int(r) => r.is_empty(),
            FieldRules::UInt(r) => r.is_empty(),
            FieldRules::Double(r) => r.num.is_empty() && !r.finite,
            FieldRules::String(r) => *r == Default::default(),
            FieldRules::Bytes(r) => *r == Default::default(),
            FieldRules::Enum(r) => *r == Default::default(),
            FieldRules::Repeated(r) => {
                r.min_items.is_none()
                    && r.max_items.is_none()
                    && !r.unique
                    && r.items.as_ref().map_or(true, |i| i.is_empty())
            }
            FieldRules::Map(r) => {
                r.min_pairs.is_none()
                    && r.max_pairs.is_none()
                    && r.keys.as_ref().map_or(true, |k| k.is_empty())
                    && r.values.as_ref().map_or(true, |v| v.is_empty())
            }
            FieldRules::Timestamp(r) => *r == Default::default(),
            FieldRules::Duration(r) => *r == Default::default(),
            FieldRules::Any(r) => *r == Default::default(),
        }
    }
}

impl<T: PartialEq> NumRules<T> {
    /// Whether no rule is present.
    pub fn is_empty(&self) -> bool {
        self.constant.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
            && self.in_list.is_empty()
            && self.not_in.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_empty() {
        assert!(FieldRules::None.is_empty());
        assert!(FieldRules::Int(NumRules::default()).is_empty());
        assert!(FieldRules::String(Box::default()).is_empty());
        assert!(FieldRules::Repeated(Box::default()).is_empty());
    }

    #[test]
    fn populated_rules_are_not_empty() {
        let rules = FieldRules::Int(NumRules {
            gte: Some(1),
            ..Default::default()
        });
        assert!(!rules.is_empty());

        let rules = FieldRules::String(Box::new(StringRules {
            min_len: Some(1),
            ..Default::default()
        }));
        assert!(!rules.is_empty());

        let rules = FieldRules::Repeated(Box::new(RepeatedRules {
            unique: true,
            ..Default::default()
        }));
        assert!(!rules.is_empty());
    }

    #[test]
    fn enum_required_conjunction_shape() {
        // The canonical required-and-meaningful enum rule set
        let rules = EnumRules {
            defined_only: true,
            not_in: vec![0],
            ..Default::default()
        };
        assert!(rules.defined_only);
        assert!(rules.not_in.contains(&0));
    }

    #[test]
    fn custom_rule_construction() {
        let rule = Rule::new(
            "order.total_positive",
            "total must be positive",
            "this.total > 0",
        );
        assert_eq!(rule.id, "order.total_positive");
        assert!(rule.expression.contains("this.total"));
    }
}
