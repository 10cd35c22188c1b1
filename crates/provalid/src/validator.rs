//! The validation walk.
//!
//! Depth-first traversal of a message instance against its compiled
//! schema. For each field: resolve presence, short-circuit on ignore
//! annotations, check `required`, apply the built-in rule set and the
//! custom expression rules, then recurse into set message-typed fields
//! with the field path prefixed. All violations are collected; nothing
//! short-circuits the sibling walk. Message-level rules run after all
//! field-level checks for the message.

use std::sync::LazyLock;

use regex::Regex;

use provalid_cel::eval::time::{format_duration, format_timestamp};
use provalid_cel::ext::{is_email, is_host_and_port, is_hostname, is_ip, is_uri, is_uri_ref};
use provalid_cel::{MapActivation, MessageValue, Timestamp, Value};
use provalid_schema::{
    AnyRules, BoolRules, BytesRules, DoubleRules, DurationRules, EnumRules, FieldDescriptor,
    FieldKind, FieldRules, Ignore, MapRules, NumRules, Presence, RepeatedRules, StringFormat,
    StringRules, TimestampRules,
};

use crate::compile::{CompiledMessage, CompiledRule, CompiledSchema};
use crate::presence::{self, zero_value, PresenceState};
use crate::violations::{FieldPath, ValidationResult, Violation};

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("uuid regex")
});

/// One validation walk over one instance.
///
/// Holds the compiled schema and the evaluation timestamp, fixed for
/// the walk so every time-relative rule sees the same `now`.
pub(crate) struct Validator<'s> {
    schema: &'s CompiledSchema,
    now: Timestamp,
}

impl<'s> Validator<'s> {
    pub(crate) fn new(schema: &'s CompiledSchema, now: Timestamp) -> Self {
        Self { schema, now }
    }

    pub(crate) fn validate_message(
        &self,
        compiled: &CompiledMessage,
        instance: &MessageValue,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        self.walk_message(compiled, instance, &FieldPath::root(), &mut result);
        result
    }

    fn walk_message(
        &self,
        compiled: &CompiledMessage,
        instance: &MessageValue,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let descriptor = &compiled.descriptor;

        for (index, field) in descriptor.fields.iter().enumerate() {
            self.check_field(field, &compiled.field_rules[index], instance, path, out);
        }

        for oneof in &descriptor.oneofs {
            let set_count = descriptor
                .oneof_members(&oneof.name)
                .filter(|member| presence::resolve(member, instance).is_set())
                .count();

            let oneof_path = path.child(&oneof.name);
            if set_count > 1 {
                out.push(Violation::new(
                    &oneof_path,
                    "oneof.multiple",
                    "only one field in the oneof can be set",
                ));
            } else if oneof.required && set_count == 0 {
                out.push(Violation::new(
                    &oneof_path,
                    "required",
                    "exactly one field is required in the oneof",
                ));
            }
        }

        // Message-level rules run last, over the whole message
        for rule in &compiled.message_rules {
            // Skip while an unguarded-read field is unset
            if rule
                .unguarded
                .iter()
                .any(|field| !instance.has_field(field))
            {
                continue;
            }
            self.eval_rule(rule, Value::message(instance.clone()), path, out);
        }
    }

    fn check_field(
        &self,
        field: &FieldDescriptor,
        cel_rules: &[CompiledRule],
        instance: &MessageValue,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let state = presence::resolve(field, instance);

        match field.ignore {
            Ignore::Always => return,
            Ignore::IfZeroValue if state != PresenceState::SetToNonDefault => return,
            _ => {}
        }

        let field_path = path.child(&field.name);

        if field.required {
            let missing = match field.presence {
                Presence::Explicit => state == PresenceState::Unset,
                Presence::Implicit => state == PresenceState::SetToDefault,
            };
            if missing {
                out.push(Violation::new(&field_path, "required", "value is required"));
            }
        }

        // Absence is not a violation unless required: nothing else
        // applies to an unset explicit-presence field
        if state == PresenceState::Unset {
            return;
        }

        let zero;
        let value = match instance.field(&field.name) {
            Some(value) => value,
            None => {
                // Implicit presence, never assigned: rules apply to the
                // zero value
                zero = zero_value(&field.kind);
                &zero
            }
        };

        if let Some(rules) = &field.rules {
            self.apply_rules(&field.kind, rules, value, &field_path, out);
        }

        for rule in cel_rules {
            self.eval_rule(rule, value.clone(), &field_path, out);
        }

        self.recurse(field, value, &field_path, out);
    }

    /// Recurse into message-typed content: a set message field, repeated
    /// message items, and map values. Child violations carry prefixed
    /// paths; a child violation never aborts sibling validation.
    fn recurse(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        match &field.kind {
            FieldKind::Message(name) => {
                if let (Some(compiled), Some(message)) =
                    (self.schema.compiled_message(name), value.as_message())
                {
                    self.walk_message(compiled, message, path, out);
                }
            }
            FieldKind::Repeated(elem) => {
                if let (FieldKind::Message(name), Some(items)) = (elem.as_ref(), value.as_list()) {
                    if let Some(compiled) = self.schema.compiled_message(name) {
                        for (i, item) in items.iter().enumerate() {
                            if let Some(message) = item.as_message() {
                                self.walk_message(compiled, message, &path.index(i), out);
                            }
                        }
                    }
                }
            }
            FieldKind::Map(_, value_kind) => {
                if let (FieldKind::Message(name), Some(map)) =
                    (value_kind.as_ref(), value.as_map())
                {
                    if let Some(compiled) = self.schema.compiled_message(name) {
                        for (key, entry) in map.iter() {
                            if let Some(message) = entry.as_message() {
                                self.walk_message(compiled, message, &path.key(key), out);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Evaluate one custom rule with `this` bound to `value`.
    ///
    /// A false result is a violation; an error value is recovered into a
    /// violation carrying the rule id, never an abort.
    fn eval_rule(
        &self,
        rule: &CompiledRule,
        value: Value,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let activation = MapActivation::new()
            .with_binding("this", value)
            .with_binding("now", Value::Timestamp(self.now));

        match rule.program.eval(&activation) {
            Value::Bool(true) => {}
            Value::Bool(false) => {
                out.push(Violation::new(path, rule.id.as_ref(), rule.message.as_ref()));
            }
            Value::Error(e) => {
                out.push(Violation::new(
                    path,
                    rule.id.as_ref(),
                    format!("{} (evaluation error: {})", rule.message, e),
                ));
            }
            other => {
                out.push(Violation::new(
                    path,
                    rule.id.as_ref(),
                    format!("{} (non-boolean result: {})", rule.message, other),
                ));
            }
        }
    }

    // ==================== Built-in Rules ====================

    fn apply_rules(
        &self,
        kind: &FieldKind,
        rules: &FieldRules,
        value: &Value,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        match rules {
            FieldRules::None => {}
            FieldRules::Bool(r) => match value.as_bool() {
                Some(b) => apply_bool_rules(r, b, path, out),
                None => push_type_violation(path, "bool", value, out),
            },
            FieldRules::Int(r) => match value.as_int() {
                Some(i) => apply_num_rules("int64", r, i, path, out),
                None => push_type_violation(path, "int", value, out),
            },
            FieldRules::UInt(r) => match value.as_uint() {
                Some(u) => apply_num_rules("uint64", r, u, path, out),
                None => push_type_violation(path, "uint", value, out),
            },
            FieldRules::Double(r) => match value.as_double() {
                Some(d) => apply_double_rules(r, d, path, out),
                None => push_type_violation(path, "double", value, out),
            },
            FieldRules::String(r) => match value.as_string() {
                Some(s) => self.apply_string_rules(r, s, path, out),
                None => push_type_violation(path, "string", value, out),
            },
            FieldRules::Bytes(r) => match value.as_bytes() {
                Some(b) => self.apply_bytes_rules(r, b, path, out),
                None => push_type_violation(path, "bytes", value, out),
            },
            FieldRules::Enum(r) => match value.as_int() {
                Some(i) => self.apply_enum_rules(kind, r, i as i32, path, out),
                None => push_type_violation(path, "enum", value, out),
            },
            FieldRules::Repeated(r) => match value.as_list() {
                Some(items) => self.apply_repeated_rules(kind, r, items, path, out),
                None => push_type_violation(path, "list", value, out),
            },
            FieldRules::Map(r) => match value.as_map() {
                Some(map) => self.apply_map_rules(kind, r, map, path, out),
                None => push_type_violation(path, "map", value, out),
            },
            FieldRules::Timestamp(r) => match value.as_timestamp() {
                Some(ts) => self.apply_timestamp_rules(r, ts, path, out),
                None => push_type_violation(path, "timestamp", value, out),
            },
            FieldRules::Duration(r) => match value.as_duration() {
                Some(d) => apply_duration_rules(r, d, path, out),
                None => push_type_violation(path, "duration", value, out),
            },
            FieldRules::Any(r) => match value.as_message() {
                Some(message) => apply_any_rules(r, message, path, out),
                None => push_type_violation(path, "any", value, out),
            },
        }
    }

    fn apply_string_rules(
        &self,
        rules: &StringRules,
        value: &str,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let chars = value.chars().count() as u64;
        let bytes = value.len() as u64;

        if let Some(constant) = &rules.constant {
            if value != constant {
                out.push(Violation::new(
                    path,
                    "string.const",
                    format!("value must equal `{}`", constant),
                ));
            }
        }
        if let Some(len) = rules.len {
            if chars != len {
                out.push(Violation::new(
                    path,
                    "string.len",
                    format!("value length must be exactly {} characters", len),
                ));
            }
        }
        if let Some(min) = rules.min_len {
            if chars < min {
                out.push(Violation::new(
                    path,
                    "string.min_len",
                    format!("value length must be at least {} characters", min),
                ));
            }
        }
        if let Some(max) = rules.max_len {
            if chars > max {
                out.push(Violation::new(
                    path,
                    "string.max_len",
                    format!("value length must be at most {} characters", max),
                ));
            }
        }
        if let Some(len) = rules.len_bytes {
            if bytes != len {
                out.push(Violation::new(
                    path,
                    "string.len_bytes",
                    format!("value length must be exactly {} bytes", len),
                ));
            }
        }
        if let Some(min) = rules.min_bytes {
            if bytes < min {
                out.push(Violation::new(
                    path,
                    "string.min_bytes",
                    format!("value length must be at least {} bytes", min),
                ));
            }
        }
        if let Some(max) = rules.max_bytes {
            if bytes > max {
                out.push(Violation::new(
                    path,
                    "string.max_bytes",
                    format!("value length must be at most {} bytes", max),
                ));
            }
        }
        if let Some(pattern) = &rules.pattern {
            if let Some(regex) = self.schema.pattern(pattern) {
                if !regex.is_match(value) {
                    out.push(Violation::new(
                        path,
                        "string.pattern",
                        format!("value does not match regex pattern `{}`", pattern),
                    ));
                }
            }
        }
        if let Some(prefix) = &rules.prefix {
            if !value.starts_with(prefix.as_str()) {
                out.push(Violation::new(
                    path,
                    "string.prefix",
                    format!("value does not have prefix `{}`", prefix),
                ));
            }
        }
        if let Some(suffix) = &rules.suffix {
            if !value.ends_with(suffix.as_str()) {
                out.push(Violation::new(
                    path,
                    "string.suffix",
                    format!("value does not have suffix `{}`", suffix),
                ));
            }
        }
        if let Some(contains) = &rules.contains {
            if !value.contains(contains.as_str()) {
                out.push(Violation::new(
                    path,
                    "string.contains",
                    format!("value does not contain substring `{}`", contains),
                ));
            }
        }
        if let Some(not_contains) = &rules.not_contains {
            if value.contains(not_contains.as_str()) {
                out.push(Violation::new(
                    path,
                    "string.not_contains",
                    format!("value contains substring `{}`", not_contains),
                ));
            }
        }
        if !rules.in_list.is_empty() && !rules.in_list.iter().any(|v| v == value) {
            out.push(Violation::new(
                path,
                "string.in",
                format!("value must be in list [{}]", rules.in_list.join(", ")),
            ));
        }
        if rules.not_in.iter().any(|v| v == value) {
            out.push(Violation::new(
                path,
                "string.not_in",
                format!("value must not be in list [{}]", rules.not_in.join(", ")),
            ));
        }
        if let Some(format) = &rules.format {
            apply_string_format(format, value, path, out);
        }
    }

    fn apply_bytes_rules(
        &self,
        rules: &BytesRules,
        value: &[u8],
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let len = value.len() as u64;

        if let Some(constant) = &rules.constant {
            if value != constant.as_slice() {
                out.push(Violation::new(path, "bytes.const", "value must equal the constant"));
            }
        }
        if let Some(exact) = rules.len {
            if len != exact {
                out.push(Violation::new(
                    path,
                    "bytes.len",
                    format!("value length must be exactly {} bytes", exact),
                ));
            }
        }
        if let Some(min) = rules.min_len {
            if len < min {
                out.push(Violation::new(
                    path,
                    "bytes.min_len",
                    format!("value length must be at least {} bytes", min),
                ));
            }
        }
        if let Some(max) = rules.max_len {
            if len > max {
                out.push(Violation::new(
                    path,
                    "bytes.max_len",
                    format!("value length must be at most {} bytes", max),
                ));
            }
        }
        if let Some(pattern) = &rules.pattern {
            if let Some(regex) = self.schema.pattern(pattern) {
                if !regex.is_match(&String::from_utf8_lossy(value)) {
                    out.push(Violation::new(
                        path,
                        "bytes.pattern",
                        format!("value does not match regex pattern `{}`", pattern),
                    ));
                }
            }
        }
        if let Some(prefix) = &rules.prefix {
            if !value.starts_with(prefix) {
                out.push(Violation::new(path, "bytes.prefix", "value does not have the required prefix"));
            }
        }
        if let Some(suffix) = &rules.suffix {
            if !value.ends_with(suffix) {
                out.push(Violation::new(path, "bytes.suffix", "value does not have the required suffix"));
            }
        }
        if let Some(contains) = &rules.contains {
            if !contains_subslice(value, contains) {
                out.push(Violation::new(
                    path,
                    "bytes.contains",
                    "value does not contain the required bytes",
                ));
            }
        }
        if !rules.in_list.is_empty() && !rules.in_list.iter().any(|v| v.as_slice() == value) {
            out.push(Violation::new(path, "bytes.in", "value must be in the allowed list"));
        }
        if rules.not_in.iter().any(|v| v.as_slice() == value) {
            out.push(Violation::new(path, "bytes.not_in", "value must not be in the blocked list"));
        }
    }

    fn apply_enum_rules(
        &self,
        kind: &FieldKind,
        rules: &EnumRules,
        value: i32,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        if let Some(constant) = rules.constant {
            if value != constant {
                out.push(Violation::new(
                    path,
                    "enum.const",
                    format!("value must equal {}", constant),
                ));
            }
        }
        if rules.defined_only {
            let defined = match kind {
                FieldKind::Enum(name) => self
                    .schema
                    .schema()
                    .get_enum(name)
                    .map(|e| e.is_defined(value))
                    .unwrap_or(false),
                _ => false,
            };
            if !defined {
                out.push(Violation::new(
                    path,
                    "enum.defined_only",
                    "value must be one of the defined enum values",
                ));
            }
        }
        if !rules.in_list.is_empty() && !rules.in_list.contains(&value) {
            out.push(Violation::new(
                path,
                "enum.in",
                format!("value must be in list [{}]", join_display(&rules.in_list)),
            ));
        }
        if rules.not_in.contains(&value) {
            out.push(Violation::new(
                path,
                "enum.not_in",
                format!("value must not be in list [{}]", join_display(&rules.not_in)),
            ));
        }
    }

    fn apply_repeated_rules(
        &self,
        kind: &FieldKind,
        rules: &RepeatedRules,
        items: &[Value],
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let count = items.len() as u64;

        if let Some(min) = rules.min_items {
            if count < min {
                out.push(Violation::new(
                    path,
                    "repeated.min_items",
                    format!("value must contain at least {} item(s)", min),
                ));
            }
        }
        if let Some(max) = rules.max_items {
            if count > max {
                out.push(Violation::new(
                    path,
                    "repeated.max_items",
                    format!("value must contain at most {} item(s)", max),
                ));
            }
        }
        if rules.unique {
            // Exactly one violation regardless of how many duplicates
            let mut has_duplicate = false;
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    has_duplicate = true;
                    break;
                }
            }
            if has_duplicate {
                out.push(Violation::new(
                    path,
                    "repeated.unique",
                    "repeated value must contain unique items",
                ));
            }
        }
        if let (Some(item_rules), FieldKind::Repeated(elem)) = (&rules.items, kind) {
            for (i, item) in items.iter().enumerate() {
                self.apply_rules(elem, item_rules, item, &path.index(i), out);
            }
        }
    }

    fn apply_map_rules(
        &self,
        kind: &FieldKind,
        rules: &MapRules,
        map: &provalid_cel::ValueMap,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let count = map.len() as u64;

        if let Some(min) = rules.min_pairs {
            if count < min {
                out.push(Violation::new(
                    path,
                    "map.min_pairs",
                    format!("value must contain at least {} pair(s)", min),
                ));
            }
        }
        if let Some(max) = rules.max_pairs {
            if count > max {
                out.push(Violation::new(
                    path,
                    "map.max_pairs",
                    format!("value must contain at most {} pair(s)", max),
                ));
            }
        }

        let (key_kind, value_kind) = match kind {
            FieldKind::Map(key, value) => (key.field_kind(), value.as_ref().clone()),
            _ => return,
        };

        if let Some(key_rules) = &rules.keys {
            for key in map.keys() {
                self.apply_rules(&key_kind, key_rules, &key.to_value(), &path.key(key), out);
            }
        }
        if let Some(value_rules) = &rules.values {
            for (key, value) in map.iter() {
                self.apply_rules(&value_kind, value_rules, value, &path.key(key), out);
            }
        }
    }

    fn apply_timestamp_rules(
        &self,
        rules: &TimestampRules,
        value: Timestamp,
        path: &FieldPath,
        out: &mut ValidationResult,
    ) {
        let ts = (value.seconds, value.nanos);

        if let Some(constant) = rules.constant {
            if ts != (constant.seconds, constant.nanos) {
                out.push(Violation::new(
                    path,
                    "timestamp.const",
                    format!("value must equal {}", format_timestamp(&constant)),
                ));
            }
        }
        if let Some(lt) = rules.lt {
            if ts >= (lt.seconds, lt.nanos) {
                out.push(Violation::new(
                    path,
                    "timestamp.lt",
                    format!("value must be before {}", format_timestamp(&lt)),
                ));
            }
        }
        if let Some(lte) = rules.lte {
            if ts > (lte.seconds, lte.nanos) {
                out.push(Violation::new(
                    path,
                    "timestamp.lte",
                    format!("value must be at or before {}", format_timestamp(&lte)),
                ));
            }
        }
        if let Some(gt) = rules.gt {
            if ts <= (gt.seconds, gt.nanos) {
                out.push(Violation::new(
                    path,
                    "timestamp.gt",
                    format!("value must be after {}", format_timestamp(&gt)),
                ));
            }
        }
        if let Some(gte) = rules.gte {
            if ts < (gte.seconds, gte.nanos) {
                out.push(Violation::new(
                    path,
                    "timestamp.gte",
                    format!("value must be at or after {}", format_timestamp(&gte)),
                ));
            }
        }

        let now = (self.now.seconds, self.now.nanos);
        if rules.lt_now && ts >= now {
            out.push(Violation::new(
                path,
                "timestamp.lt_now",
                "value must be in the past",
            ));
        }
        if rules.gt_now && ts <= now {
            out.push(Violation::new(
                path,
                "timestamp.gt_now",
                "value must be in the future",
            ));
        }
        if let Some(within) = rules.within {
            let diff_nanos = (value.seconds as i128 - self.now.seconds as i128) * 1_000_000_000
                + (value.nanos as i128 - self.now.nanos as i128);
            if diff_nanos.unsigned_abs() > within.to_nanos().unsigned_abs() as u128 {
                out.push(Violation::new(
                    path,
                    "timestamp.within",
                    format!(
                        "value must be within {} of the current time",
                        format_duration(&within)
                    ),
                ));
            }
        }
    }
}

// ==================== Free Rule Helpers ====================

fn apply_bool_rules(rules: &BoolRules, value: bool, path: &FieldPath, out: &mut ValidationResult) {
    if let Some(constant) = rules.constant {
        if value != constant {
            out.push(Violation::new(
                path,
                "bool.const",
                format!("value must equal {}", constant),
            ));
        }
    }
}

fn apply_num_rules<T>(
    prefix: &str,
    rules: &NumRules<T>,
    value: T,
    path: &FieldPath,
    out: &mut ValidationResult,
) where
    T: PartialOrd + PartialEq + Copy + std::fmt::Display,
{
    if let Some(constant) = rules.constant {
        if value != constant {
            out.push(Violation::new(
                path,
                format!("{}.const", prefix),
                format!("value must equal {}", constant),
            ));
        }
    }
    if let Some(lt) = rules.lt {
        if value >= lt {
            out.push(Violation::new(
                path,
                format!("{}.lt", prefix),
                format!("value must be less than {}", lt),
            ));
        }
    }
    if let Some(lte) = rules.lte {
        if value > lte {
            out.push(Violation::new(
                path,
                format!("{}.lte", prefix),
                format!("value must be less than or equal to {}", lte),
            ));
        }
    }
    if let Some(gt) = rules.gt {
        if value <= gt {
            out.push(Violation::new(
                path,
                format!("{}.gt", prefix),
                format!("value must be greater than {}", gt),
            ));
        }
    }
    if let Some(gte) = rules.gte {
        if value < gte {
            out.push(Violation::new(
                path,
                format!("{}.gte", prefix),
                format!("value must be greater than or equal to {}", gte),
            ));
        }
    }
    if !rules.in_list.is_empty() && !rules.in_list.iter().any(|v| *v == value) {
        out.push(Violation::new(
            path,
            format!("{}.in", prefix),
            format!("value must be in list [{}]", join_display(&rules.in_list)),
        ));
    }
    if rules.not_in.iter().any(|v| *v == value) {
        out.push(Violation::new(
            path,
            format!("{}.not_in", prefix),
            format!("value must not be in list [{}]", join_display(&rules.not_in)),
        ));
    }
}

fn apply_double_rules(
    rules: &DoubleRules,
    value: f64,
    path: &FieldPath,
    out: &mut ValidationResult,
) {
    if rules.finite && !value.is_finite() {
        out.push(Violation::new(
            path,
            "double.finite",
            "value must be finite",
        ));
    }
    apply_num_rules("double", &rules.num, value, path, out);
}

fn apply_duration_rules(
    rules: &DurationRules,
    value: provalid_cel::Duration,
    path: &FieldPath,
    out: &mut ValidationResult,
) {
    let nanos = value.to_nanos();

    if let Some(constant) = rules.constant {
        if nanos != constant.to_nanos() {
            out.push(Violation::new(
                path,
                "duration.const",
                format!("value must equal {}", format_duration(&constant)),
            ));
        }
    }
    if let Some(lt) = rules.lt {
        if nanos >= lt.to_nanos() {
            out.push(Violation::new(
                path,
                "duration.lt",
                format!("value must be less than {}", format_duration(&lt)),
            ));
        }
    }
    if let Some(lte) = rules.lte {
        if nanos > lte.to_nanos() {
            out.push(Violation::new(
                path,
                "duration.lte",
                format!("value must be at most {}", format_duration(&lte)),
            ));
        }
    }
    if let Some(gt) = rules.gt {
        if nanos <= gt.to_nanos() {
            out.push(Violation::new(
                path,
                "duration.gt",
                format!("value must be greater than {}", format_duration(&gt)),
            ));
        }
    }
    if let Some(gte) = rules.gte {
        if nanos < gte.to_nanos() {
            out.push(Violation::new(
                path,
                "duration.gte",
                format!("value must be at least {}", format_duration(&gte)),
            ));
        }
    }
    if !rules.in_list.is_empty() && !rules.in_list.iter().any(|v| v.to_nanos() == nanos) {
        out.push(Violation::new(
            path,
            "duration.in",
            "value must be in the allowed list",
        ));
    }
    if rules.not_in.iter().any(|v| v.to_nanos() == nanos) {
        out.push(Violation::new(
            path,
            "duration.not_in",
            "value must not be in the blocked list",
        ));
    }
}

fn apply_any_rules(
    rules: &AnyRules,
    message: &MessageValue,
    path: &FieldPath,
    out: &mut ValidationResult,
) {
    let type_url = message
        .field("type_url")
        .and_then(|v| v.as_string())
        .unwrap_or("");

    if !rules.in_list.is_empty() && !rules.in_list.iter().any(|v| v == type_url) {
        out.push(Violation::new(
            path,
            "any.in",
            format!("type URL must be in list [{}]", rules.in_list.join(", ")),
        ));
    }
    if rules.not_in.iter().any(|v| v == type_url) {
        out.push(Violation::new(
            path,
            "any.not_in",
            format!("type URL must not be in list [{}]", rules.not_in.join(", ")),
        ));
    }
}

fn apply_string_format(
    format: &StringFormat,
    value: &str,
    path: &FieldPath,
    out: &mut ValidationResult,
) {
    let (ok, rule_id, message): (bool, &str, &str) = match format {
        StringFormat::Email => (is_email(value), "string.email", "value must be a valid email address"),
        StringFormat::Hostname => (
            is_hostname(value),
            "string.hostname",
            "value must be a valid hostname",
        ),
        StringFormat::Ip => (is_ip(value, None), "string.ip", "value must be a valid IP address"),
        StringFormat::Ipv4 => (
            is_ip(value, Some(4)),
            "string.ipv4",
            "value must be a valid IPv4 address",
        ),
        StringFormat::Ipv6 => (
            is_ip(value, Some(6)),
            "string.ipv6",
            "value must be a valid IPv6 address",
        ),
        StringFormat::Uri => (is_uri(value), "string.uri", "value must be a valid URI"),
        StringFormat::UriRef => (
            is_uri_ref(value),
            "string.uri_ref",
            "value must be a valid URI reference",
        ),
        StringFormat::Uuid => (
            UUID_RE.is_match(value),
            "string.uuid",
            "value must be a valid UUID",
        ),
        StringFormat::Address => (
            is_hostname(value) || is_ip(value, None),
            "string.address",
            "value must be a valid hostname or IP address",
        ),
        StringFormat::HostAndPort { port_required } => (
            is_host_and_port(value, *port_required),
            "string.host_and_port",
            "value must be a valid host and port pair",
        ),
    };

    if !ok {
        out.push(Violation::new(path, rule_id, message));
    }
}

fn push_type_violation(path: &FieldPath, expected: &str, value: &Value, out: &mut ValidationResult) {
    out.push(Violation::new(
        path,
        "type",
        format!("expected {} value, got {}", expected, value.type_name()),
    ));
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subslice_search() {
        assert!(contains_subslice(b"hello world", b"lo wo"));
        assert!(contains_subslice(b"abc", b""));
        assert!(!contains_subslice(b"abc", b"abcd"));
    }

    #[test]
    fn uuid_regex() {
        assert!(UUID_RE.is_match("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!UUID_RE.is_match("not-a-uuid"));
        assert!(!UUID_RE.is_match("123e4567e89b12d3a456426614174000"));
    }
}
