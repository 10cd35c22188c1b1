//! Presence resolution.
//!
//! Determines, per field, whether a value counts as set. Explicit-presence
//! fields (optional scalars, message fields, oneof members) distinguish
//! Unset from set-to-default; implicit-presence fields never report Unset,
//! since absence of assignment is indistinguishable from the zero value.
//!
//! The result gates `required` and the value rules: a `required` rule on
//! an explicit-presence field fails only on Unset, while on an
//! implicit-presence field it fails when the value equals the type's
//! zero value.

use provalid_cel::{MessageValue, Value};
use provalid_schema::{FieldDescriptor, FieldKind, Presence};

/// The presence state of a field on one message instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// The field is not set. Only explicit-presence fields report this.
    Unset,
    /// The field holds its type's zero value (or, for implicit presence,
    /// was never assigned).
    SetToDefault,
    /// The field holds a non-zero value.
    SetToNonDefault,
}

impl PresenceState {
    /// Whether the field counts as set at all.
    pub fn is_set(&self) -> bool {
        !matches!(self, PresenceState::Unset)
    }
}

/// Resolve the presence state of `field` on `message`.
pub fn resolve(field: &FieldDescriptor, message: &MessageValue) -> PresenceState {
    match message.field(&field.name) {
        None => match field.presence {
            Presence::Explicit => PresenceState::Unset,
            Presence::Implicit => PresenceState::SetToDefault,
        },
        Some(value) => {
            if value.is_zero() {
                PresenceState::SetToDefault
            } else {
                PresenceState::SetToNonDefault
            }
        }
    }
}

/// The zero value for a field kind.
///
/// Used to materialize values for implicit-presence fields the decoder
/// left out, so value rules still apply to them.
pub fn zero_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Bool => Value::Bool(false),
        FieldKind::Int | FieldKind::Enum(_) => Value::Int(0),
        FieldKind::UInt => Value::UInt(0),
        FieldKind::Double => Value::Double(0.0),
        FieldKind::String => Value::string(""),
        FieldKind::Bytes => Value::bytes(Vec::new()),
        FieldKind::Timestamp => Value::timestamp(0, 0),
        FieldKind::Duration => Value::duration(0, 0),
        FieldKind::Message(name) => Value::message(MessageValue::new(name.clone())),
        FieldKind::Any => Value::message(MessageValue::new("google.protobuf.Any")),
        FieldKind::FieldMask => Value::message(MessageValue::new("google.protobuf.FieldMask")),
        FieldKind::Repeated(_) => Value::list(Vec::new()),
        FieldKind::Map(_, _) => Value::map(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provalid_schema::FieldDescriptor;

    #[test]
    fn explicit_presence_distinguishes_unset_from_default() {
        let field = FieldDescriptor::new("nick", 1, FieldKind::String).optional();

        let unset = MessageValue::new("acme.User");
        assert_eq!(resolve(&field, &unset), PresenceState::Unset);

        let set_default = MessageValue::new("acme.User").with_field("nick", "");
        assert_eq!(resolve(&field, &set_default), PresenceState::SetToDefault);

        let set = MessageValue::new("acme.User").with_field("nick", "ada");
        assert_eq!(resolve(&field, &set), PresenceState::SetToNonDefault);
    }

    #[test]
    fn implicit_presence_never_reports_unset() {
        let field = FieldDescriptor::new("name", 1, FieldKind::String);

        let absent = MessageValue::new("acme.User");
        assert_eq!(resolve(&field, &absent), PresenceState::SetToDefault);

        let zero = MessageValue::new("acme.User").with_field("name", "");
        assert_eq!(resolve(&field, &zero), PresenceState::SetToDefault);

        let set = MessageValue::new("acme.User").with_field("name", "ada");
        assert_eq!(resolve(&field, &set), PresenceState::SetToNonDefault);
    }

    #[test]
    fn message_fields_are_explicit() {
        let field = FieldDescriptor::new(
            "address",
            1,
            FieldKind::Message(std::sync::Arc::from("acme.Address")),
        );

        let unset = MessageValue::new("acme.User");
        assert_eq!(resolve(&field, &unset), PresenceState::Unset);

        let set_empty = MessageValue::new("acme.User")
            .with_field("address", MessageValue::new("acme.Address"));
        assert_eq!(resolve(&field, &set_empty), PresenceState::SetToDefault);
    }

    #[test]
    fn zero_values_are_zero() {
        assert!(zero_value(&FieldKind::Bool).is_zero());
        assert!(zero_value(&FieldKind::String).is_zero());
        assert!(zero_value(&FieldKind::Repeated(Box::new(FieldKind::Int))).is_zero());
        assert!(zero_value(&FieldKind::Timestamp).is_zero());
    }
}
