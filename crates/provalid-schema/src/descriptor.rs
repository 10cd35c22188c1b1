//! Schema descriptors.
//!
//! The in-memory representation of message, field, enum, and oneof
//! definitions with their attached constraint rules. Descriptors are
//! produced by an external schema loader, assembled into a [`SchemaSet`],
//! and immutable from then on.

use std::collections::BTreeMap;
use std::sync::Arc;

use provalid_cel::bind::FieldTypeProvider;
use provalid_cel::ExprType;

use crate::rules::{FieldRules, Ignore, Rule};

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    /// All signed integer wire types (int32/64, sint, sfixed).
    Int,
    /// All unsigned integer wire types (uint32/64, fixed).
    UInt,
    /// float and double.
    Double,
    String,
    Bytes,
    /// Enum field, identified by the enum's fully qualified name.
    Enum(Arc<str>),
    /// Message field, identified by the message's fully qualified name.
    Message(Arc<str>),
    /// `google.protobuf.Timestamp`.
    Timestamp,
    /// `google.protobuf.Duration`.
    Duration,
    /// `google.protobuf.Any`.
    Any,
    /// `google.protobuf.FieldMask`.
    FieldMask,
    /// Repeated field with an element kind.
    Repeated(Box<FieldKind>),
    /// Map field with a key kind and value kind.
    Map(MapKeyKind, Box<FieldKind>),
}

/// Permitted map key kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKeyKind {
    Bool,
    Int,
    UInt,
    String,
}

impl FieldKind {
    /// The expression type a value of this kind binds as.
    ///
    /// Enum values bind as `int`; the well-known wrapper types bind as
    /// their message types.
    pub fn expr_type(&self) -> ExprType {
        match self {
            FieldKind::Bool => ExprType::Bool,
            FieldKind::Int => ExprType::Int,
            FieldKind::UInt => ExprType::UInt,
            FieldKind::Double => ExprType::Double,
            FieldKind::String => ExprType::String,
            FieldKind::Bytes => ExprType::Bytes,
            FieldKind::Enum(_) => ExprType::Int,
            FieldKind::Message(name) => ExprType::Message(name.clone()),
            FieldKind::Timestamp => ExprType::Timestamp,
            FieldKind::Duration => ExprType::Duration,
            FieldKind::Any => ExprType::message("google.protobuf.Any"),
            FieldKind::FieldMask => ExprType::message("google.protobuf.FieldMask"),
            FieldKind::Repeated(elem) => ExprType::list(elem.expr_type()),
            FieldKind::Map(key, value) => ExprType::map(key.expr_type(), value.expr_type()),
        }
    }

    /// Whether fields of this kind default to explicit presence.
    ///
    /// Message-typed fields (including the well-known types) always track
    /// presence; bare scalars, repeated fields, and maps do not.
    pub fn default_presence(&self) -> Presence {
        match self {
            FieldKind::Message(_)
            | FieldKind::Timestamp
            | FieldKind::Duration
            | FieldKind::Any
            | FieldKind::FieldMask => Presence::Explicit,
            _ => Presence::Implicit,
        }
    }

    /// Whether this kind is a scalar (a valid `unique` item kind).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldKind::Bool
                | FieldKind::Int
                | FieldKind::UInt
                | FieldKind::Double
                | FieldKind::String
                | FieldKind::Bytes
                | FieldKind::Enum(_)
        )
    }
}

impl MapKeyKind {
    /// The expression type for keys of this kind.
    pub fn expr_type(&self) -> ExprType {
        match self {
            MapKeyKind::Bool => ExprType::Bool,
            MapKeyKind::Int => ExprType::Int,
            MapKeyKind::UInt => ExprType::UInt,
            MapKeyKind::String => ExprType::String,
        }
    }

    /// The scalar field kind for keys of this kind.
    pub fn field_kind(&self) -> FieldKind {
        match self {
            MapKeyKind::Bool => FieldKind::Bool,
            MapKeyKind::Int => FieldKind::Int,
            MapKeyKind::UInt => FieldKind::UInt,
            MapKeyKind::String => FieldKind::String,
        }
    }
}

/// Presence discipline for a field.
///
/// Explicit-presence fields distinguish Unset from set-to-default;
/// implicit-presence fields cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Explicit,
    Implicit,
}

/// A field definition with its attached rules.
///
/// Owned by its enclosing [`MessageDescriptor`]; immutable after schema
/// assembly.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: Arc<str>,
    /// Field number.
    pub number: i32,
    /// Declared type.
    pub kind: FieldKind,
    /// Presence discipline.
    pub presence: Presence,
    /// Name of the containing oneof, if any.
    pub oneof: Option<Arc<str>>,
    /// The field must be set (explicit presence) or non-zero (implicit).
    pub required: bool,
    /// Ignore annotation, short-circuiting all rules for the field.
    pub ignore: Ignore,
    /// Built-in typed rules.
    pub rules: Option<FieldRules>,
    /// Custom expression rules; `this` binds to the field value.
    pub cel_rules: Vec<Rule>,
}

impl FieldDescriptor {
    /// Create a field with the kind's default presence and no rules.
    pub fn new(name: impl Into<Arc<str>>, number: i32, kind: FieldKind) -> Self {
        let presence = kind.default_presence();
        Self {
            name: name.into(),
            number,
            kind,
            presence,
            oneof: None,
            required: false,
            ignore: Ignore::Unspecified,
            rules: None,
            cel_rules: Vec::new(),
        }
    }

    /// Mark as a proto3 `optional` field (explicit presence).
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Explicit;
        self
    }

    /// Place the field in a oneof. Oneof members have explicit presence.
    pub fn in_oneof(mut self, oneof: impl Into<Arc<str>>) -> Self {
        self.oneof = Some(oneof.into());
        self.presence = Presence::Explicit;
        self
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach an ignore annotation.
    pub fn ignore(mut self, ignore: Ignore) -> Self {
        self.ignore = ignore;
        self
    }

    /// Attach built-in rules.
    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Attach a custom expression rule.
    pub fn with_cel_rule(mut self, rule: Rule) -> Self {
        self.cel_rules.push(rule);
        self
    }
}

/// A oneof declaration.
#[derive(Debug, Clone)]
pub struct OneofDescriptor {
    /// Oneof name.
    pub name: Arc<str>,
    /// Exactly one member must be set.
    pub required: bool,
}

impl OneofDescriptor {
    /// Create a oneof declaration.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// Require exactly one member to be set.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A message definition.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    /// Fully qualified message name.
    pub full_name: Arc<str>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Oneof declarations.
    pub oneofs: Vec<OneofDescriptor>,
    /// Message-level expression rules; `this` binds to the whole message.
    pub cel_rules: Vec<Rule>,
}

impl MessageDescriptor {
    /// Create an empty message descriptor.
    pub fn new(full_name: impl Into<Arc<str>>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            cel_rules: Vec::new(),
        }
    }

    /// Add a field (builder pattern).
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a oneof declaration (builder pattern).
    pub fn with_oneof(mut self, oneof: OneofDescriptor) -> Self {
        self.oneofs.push(oneof);
        self
    }

    /// Add a message-level expression rule (builder pattern).
    pub fn with_cel_rule(mut self, rule: Rule) -> Self {
        self.cel_rules.push(rule);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }

    /// The member fields of a oneof, in declaration order.
    pub fn oneof_members<'a>(
        &'a self,
        oneof: &'a str,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.oneof.as_deref() == Some(oneof))
    }
}

/// An enum definition.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Fully qualified enum name.
    pub full_name: Arc<str>,
    /// Declared values: number to name.
    pub values: BTreeMap<i32, Arc<str>>,
}

impl EnumDescriptor {
    /// Create an empty enum descriptor.
    pub fn new(full_name: impl Into<Arc<str>>) -> Self {
        Self {
            full_name: full_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Add a declared value (builder pattern).
    pub fn with_value(mut self, number: i32, name: impl Into<Arc<str>>) -> Self {
        self.values.insert(number, name.into());
        self
    }

    /// Whether the number matches a declared enumerant.
    pub fn is_defined(&self, number: i32) -> bool {
        self.values.contains_key(&number)
    }
}

/// A set of message and enum descriptors, keyed by fully qualified name.
///
/// This is the schema handed to the engine for compilation. BTreeMaps
/// keep iteration deterministic.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    messages: BTreeMap<Arc<str>, Arc<MessageDescriptor>>,
    enums: BTreeMap<Arc<str>, Arc<EnumDescriptor>>,
}

impl SchemaSet {
    /// Create an empty schema set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message descriptor (builder pattern).
    pub fn with_message(mut self, message: MessageDescriptor) -> Self {
        self.add_message(message);
        self
    }

    /// Add an enum descriptor (builder pattern).
    pub fn with_enum(mut self, enum_desc: EnumDescriptor) -> Self {
        self.add_enum(enum_desc);
        self
    }

    /// Add a message descriptor.
    pub fn add_message(&mut self, message: MessageDescriptor) {
        self.messages
            .insert(message.full_name.clone(), Arc::new(message));
    }

    /// Add an enum descriptor.
    pub fn add_enum(&mut self, enum_desc: EnumDescriptor) {
        self.enums
            .insert(enum_desc.full_name.clone(), Arc::new(enum_desc));
    }

    /// Look up a message by fully qualified name.
    pub fn message(&self, full_name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(full_name)
    }

    /// Look up an enum by fully qualified name.
    pub fn get_enum(&self, full_name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(full_name)
    }

    /// Iterate over messages in name order.
    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.messages.values()
    }
}

impl FieldTypeProvider for SchemaSet {
    fn field_type(&self, message: &str, field: &str) -> Option<ExprType> {
        // Well-known types have fixed shapes not present in the set
        match (message, field) {
            ("google.protobuf.Any", "type_url") => return Some(ExprType::String),
            ("google.protobuf.Any", "value") => return Some(ExprType::Bytes),
            ("google.protobuf.FieldMask", "paths") => {
                return Some(ExprType::list(ExprType::String))
            }
            _ => {}
        }

        self.messages
            .get(message)?
            .field(field)
            .map(|f| f.kind.expr_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_expr_types() {
        assert_eq!(FieldKind::String.expr_type(), ExprType::String);
        assert_eq!(FieldKind::Enum(Arc::from("acme.Status")).expr_type(), ExprType::Int);
        assert_eq!(
            FieldKind::Repeated(Box::new(FieldKind::Int)).expr_type(),
            ExprType::list(ExprType::Int)
        );
        assert_eq!(
            FieldKind::Map(MapKeyKind::String, Box::new(FieldKind::Bool)).expr_type(),
            ExprType::map(ExprType::String, ExprType::Bool)
        );
    }

    #[test]
    fn default_presence() {
        assert_eq!(FieldKind::String.default_presence(), Presence::Implicit);
        assert_eq!(
            FieldKind::Message(Arc::from("acme.Nested")).default_presence(),
            Presence::Explicit
        );
        assert_eq!(FieldKind::Timestamp.default_presence(), Presence::Explicit);
        assert_eq!(
            FieldKind::Repeated(Box::new(FieldKind::String)).default_presence(),
            Presence::Implicit
        );
    }

    #[test]
    fn optional_scalar_is_explicit() {
        let field = FieldDescriptor::new("nick", 1, FieldKind::String).optional();
        assert_eq!(field.presence, Presence::Explicit);
    }

    #[test]
    fn oneof_member_is_explicit() {
        let field = FieldDescriptor::new("email", 1, FieldKind::String).in_oneof("contact");
        assert_eq!(field.presence, Presence::Explicit);
        assert_eq!(field.oneof.as_deref(), Some("contact"));
    }

    #[test]
    fn message_field_lookup() {
        let msg = MessageDescriptor::new("acme.User")
            .with_field(FieldDescriptor::new("name", 1, FieldKind::String))
            .with_field(FieldDescriptor::new("age", 2, FieldKind::Int));

        assert!(msg.field("name").is_some());
        assert!(msg.field("missing").is_none());
    }

    #[test]
    fn oneof_members() {
        let msg = MessageDescriptor::new("acme.Contact")
            .with_oneof(OneofDescriptor::new("via").required())
            .with_field(FieldDescriptor::new("email", 1, FieldKind::String).in_oneof("via"))
            .with_field(FieldDescriptor::new("phone", 2, FieldKind::String).in_oneof("via"))
            .with_field(FieldDescriptor::new("note", 3, FieldKind::String));

        let members: Vec<_> = msg.oneof_members("via").map(|f| f.name.clone()).collect();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn enum_defined_values() {
        let status = EnumDescriptor::new("acme.Status")
            .with_value(0, "STATUS_UNSPECIFIED")
            .with_value(1, "STATUS_ACTIVE")
            .with_value(2, "STATUS_DISABLED");

        assert!(status.is_defined(0));
        assert!(status.is_defined(2));
        assert!(!status.is_defined(99));
    }

    #[test]
    fn schema_set_type_provider() {
        let schema = SchemaSet::new().with_message(
            MessageDescriptor::new("acme.User")
                .with_field(FieldDescriptor::new("name", 1, FieldKind::String)),
        );

        assert_eq!(
            schema.field_type("acme.User", "name"),
            Some(ExprType::String)
        );
        assert_eq!(schema.field_type("acme.User", "missing"), None);
        assert_eq!(schema.field_type("acme.Unknown", "name"), None);
        assert_eq!(
            schema.field_type("google.protobuf.Any", "type_url"),
            Some(ExprType::String)
        );
    }
}
