//! End-to-end validation behavior.

use std::sync::Arc;

use provalid::{compile, CompiledSchema, MessageValue, SchemaSet, Value};
use provalid_schema::{
    EnumDescriptor, EnumRules, FieldDescriptor, FieldKind, FieldRules, Ignore, MapRules,
    MessageDescriptor, NumRules, OneofDescriptor, RepeatedRules, Rule, StringRules,
};

fn compile_ok(schema: SchemaSet) -> CompiledSchema {
    compile(schema).expect("schema should compile")
}

fn rule_ids(result: &provalid::ValidationResult) -> Vec<&str> {
    result.violations().iter().map(|v| v.rule_id.as_str()).collect()
}

/// The schema used by most tests: a user record with required fields,
/// an enum status, repeated tags, and a nested address.
fn user_schema() -> SchemaSet {
    SchemaSet::new()
        .with_enum(
            EnumDescriptor::new("acme.Status")
                .with_value(0, "STATUS_UNSPECIFIED")
                .with_value(1, "STATUS_ACTIVE")
                .with_value(2, "STATUS_DISABLED"),
        )
        .with_message(
            MessageDescriptor::new("acme.Address")
                .with_field(
                    FieldDescriptor::new("city", 1, FieldKind::String)
                        .required()
                        .with_rules(FieldRules::String(Box::new(StringRules {
                            min_len: Some(1),
                            ..Default::default()
                        }))),
                )
                .with_field(FieldDescriptor::new("zip", 2, FieldKind::String)),
        )
        .with_message(
            MessageDescriptor::new("acme.User")
                .with_field(
                    FieldDescriptor::new("name", 1, FieldKind::String)
                        .required()
                        .with_rules(FieldRules::String(Box::new(StringRules {
                            min_len: Some(1),
                            max_len: Some(64),
                            ..Default::default()
                        }))),
                )
                .with_field(
                    FieldDescriptor::new("status", 2, FieldKind::Enum(Arc::from("acme.Status")))
                        .with_rules(FieldRules::Enum(EnumRules {
                            defined_only: true,
                            not_in: vec![0],
                            ..Default::default()
                        })),
                )
                .with_field(
                    FieldDescriptor::new(
                        "tags",
                        3,
                        FieldKind::Repeated(Box::new(FieldKind::String)),
                    )
                    .with_rules(FieldRules::Repeated(Box::new(RepeatedRules {
                        unique: true,
                        max_items: Some(10),
                        ..Default::default()
                    }))),
                )
                .with_field(FieldDescriptor::new(
                    "address",
                    4,
                    FieldKind::Message(Arc::from("acme.Address")),
                )),
        )
}

// ==================== Required and Presence ====================

#[test]
fn empty_instance_violates_exactly_the_required_fields() {
    let compiled = compile_ok(user_schema());
    let result = compiled.validate(&MessageValue::new("acme.User")).unwrap();

    // name is required and implicit-presence zero; status/tags/address
    // have no required rule, and their other rules do not fire on
    // unset/zero values except enum not_in on the zero value
    let required: Vec<_> = result
        .violations()
        .iter()
        .filter(|v| v.rule_id == "required")
        .collect();
    assert_eq!(required.len(), 1);
    assert_eq!(required[0].field_path, "name");
}

#[test]
fn required_on_explicit_presence_field() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Form").with_field(
            FieldDescriptor::new("nickname", 1, FieldKind::String)
                .optional()
                .required(),
        ),
    );
    let compiled = compile_ok(schema);

    // Unset: violation
    let result = compiled.validate(&MessageValue::new("acme.Form")).unwrap();
    assert_eq!(rule_ids(&result), vec!["required"]);

    // Set to the zero value: no violation
    let instance = MessageValue::new("acme.Form").with_field("nickname", "");
    assert!(compiled.validate(&instance).unwrap().is_valid());

    // Set to a non-zero value: no violation
    let instance = MessageValue::new("acme.Form").with_field("nickname", "ada");
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

#[test]
fn required_on_implicit_presence_field() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Form")
            .with_field(FieldDescriptor::new("name", 1, FieldKind::String).required()),
    );
    let compiled = compile_ok(schema);

    // Absent and zero-valued are indistinguishable: both violate
    let result = compiled.validate(&MessageValue::new("acme.Form")).unwrap();
    assert_eq!(rule_ids(&result), vec!["required"]);

    let instance = MessageValue::new("acme.Form").with_field("name", "");
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["required"]);

    // Any other value passes
    let instance = MessageValue::new("acme.Form").with_field("name", "ada");
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

// ==================== Enum Rules ====================

#[test]
fn enum_required_conjunction() {
    let compiled = compile_ok(user_schema());

    // Zero value: not_in {0} fires
    let instance = MessageValue::new("acme.User")
        .with_field("name", "ada")
        .with_field("status", 0i64);
    let result = compiled.validate(&instance).unwrap();
    assert!(rule_ids(&result).contains(&"enum.not_in"));
    assert!(!rule_ids(&result).contains(&"enum.defined_only"));

    // Undeclared value: defined_only fires
    let instance = MessageValue::new("acme.User")
        .with_field("name", "ada")
        .with_field("status", 99i64);
    let result = compiled.validate(&instance).unwrap();
    assert!(rule_ids(&result).contains(&"enum.defined_only"));

    // Declared non-zero value: no violation
    let instance = MessageValue::new("acme.User")
        .with_field("name", "ada")
        .with_field("status", 1i64);
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

// ==================== Repeated and Map Rules ====================

#[test]
fn unique_emits_exactly_one_violation_for_any_number_of_duplicates() {
    let compiled = compile_ok(user_schema());

    let instance = MessageValue::new("acme.User")
        .with_field("name", "ada")
        .with_field(
            "tags",
            Value::list(vec![
                Value::from("a"),
                Value::from("a"),
                Value::from("b"),
                Value::from("b"),
                Value::from("b"),
            ]),
        );
    let result = compiled.validate(&instance).unwrap();
    let unique: Vec<_> = result
        .violations()
        .iter()
        .filter(|v| v.rule_id == "repeated.unique")
        .collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].field_path, "tags");
}

#[test]
fn map_min_pairs() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Labels").with_field(
            FieldDescriptor::new(
                "labels",
                1,
                FieldKind::Map(
                    provalid_schema::MapKeyKind::String,
                    Box::new(FieldKind::String),
                ),
            )
            .with_rules(FieldRules::Map(Box::new(MapRules {
                min_pairs: Some(1),
                ..Default::default()
            }))),
        ),
    );
    let compiled = compile_ok(schema);

    let result = compiled.validate(&MessageValue::new("acme.Labels")).unwrap();
    assert_eq!(rule_ids(&result), vec!["map.min_pairs"]);

    let instance = MessageValue::new("acme.Labels").with_field(
        "labels",
        Value::map([(
            provalid_cel::MapKey::String(Arc::from("env")),
            Value::from("prod"),
        )]),
    );
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

#[test]
fn items_rules_apply_per_element_with_indexed_paths() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Doc").with_field(
            FieldDescriptor::new("lines", 1, FieldKind::Repeated(Box::new(FieldKind::String)))
                .with_rules(FieldRules::Repeated(Box::new(RepeatedRules {
                    items: Some(FieldRules::String(Box::new(StringRules {
                        min_len: Some(1),
                        ..Default::default()
                    }))),
                    ..Default::default()
                }))),
        ),
    );
    let compiled = compile_ok(schema);

    let instance = MessageValue::new("acme.Doc").with_field(
        "lines",
        Value::list(vec![Value::from("ok"), Value::from(""), Value::from("ok")]),
    );
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.violations()[0].field_path, "lines[1]");
    assert_eq!(result.violations()[0].rule_id, "string.min_len");
}

// ==================== Nesting ====================

#[test]
fn child_violations_are_path_prefixed_and_do_not_stop_siblings() {
    let compiled = compile_ok(user_schema());

    let instance = MessageValue::new("acme.User")
        .with_field("name", "")
        .with_field("address", MessageValue::new("acme.Address"));
    let result = compiled.validate(&instance).unwrap();

    let ids_and_paths: Vec<_> = result
        .violations()
        .iter()
        .map(|v| (v.field_path.as_str(), v.rule_id.as_str()))
        .collect();

    // The empty name violates both rules on the parent, and the nested
    // empty address reports its own required city, prefixed
    assert!(ids_and_paths.contains(&("name", "required")));
    assert!(ids_and_paths.contains(&("name", "string.min_len")));
    assert!(ids_and_paths.contains(&("address.city", "required")));
}

// ==================== Oneofs ====================

#[test]
fn oneof_requires_exactly_one_member() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Contact")
            .with_oneof(OneofDescriptor::new("via").required())
            .with_field(FieldDescriptor::new("email", 1, FieldKind::String).in_oneof("via"))
            .with_field(FieldDescriptor::new("phone", 2, FieldKind::String).in_oneof("via")),
    );
    let compiled = compile_ok(schema);

    // None set
    let result = compiled.validate(&MessageValue::new("acme.Contact")).unwrap();
    assert_eq!(rule_ids(&result), vec!["required"]);
    assert_eq!(result.violations()[0].field_path, "via");

    // Exactly one set
    let instance = MessageValue::new("acme.Contact").with_field("email", "a@example.com");
    assert!(compiled.validate(&instance).unwrap().is_valid());

    // Both set
    let instance = MessageValue::new("acme.Contact")
        .with_field("email", "a@example.com")
        .with_field("phone", "555-0100");
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["oneof.multiple"]);
}

// ==================== Determinism ====================

#[test]
fn validation_is_deterministic() {
    let compiled = compile_ok(user_schema());
    let instance = MessageValue::new("acme.User")
        .with_field("name", "")
        .with_field("status", 99i64)
        .with_field(
            "tags",
            Value::list(vec![Value::from("x"), Value::from("x")]),
        );

    let first = compiled.validate(&instance).unwrap();
    let second = compiled.validate(&instance).unwrap();
    assert_eq!(first, second);
    assert!(!first.is_valid());
}

// ==================== Cross-field Message Rules ====================

fn span_schema(expression: &str) -> SchemaSet {
    SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Span")
            .with_field(FieldDescriptor::new("start", 1, FieldKind::Timestamp))
            .with_field(FieldDescriptor::new("end", 2, FieldKind::Timestamp))
            .with_cel_rule(Rule::new(
                "span.order",
                "end must come after start",
                expression,
            )),
    )
}

#[test]
fn cross_field_rule_fires_on_out_of_order_dates() {
    let compiled = compile_ok(span_schema("this.end > this.start"));

    let instance = MessageValue::new("acme.Span")
        .with_field("start", Value::timestamp(200, 0))
        .with_field("end", Value::timestamp(100, 0));
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["span.order"]);

    let instance = MessageValue::new("acme.Span")
        .with_field("start", Value::timestamp(100, 0))
        .with_field("end", Value::timestamp(200, 0));
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

#[test]
fn unguarded_cross_field_rule_is_skipped_when_a_read_field_is_unset() {
    let compiled = compile_ok(span_schema("this.end > this.start"));

    // end unset: the rule reads it without has(), so the rule is skipped
    let instance = MessageValue::new("acme.Span").with_field("start", Value::timestamp(100, 0));
    assert!(compiled.validate(&instance).unwrap().is_valid());

    // both unset: also skipped
    assert!(compiled.validate(&MessageValue::new("acme.Span")).unwrap().is_valid());
}

#[test]
fn guarded_cross_field_rule_evaluates_the_guard() {
    let compiled = compile_ok(span_schema(
        "has(this.end) ? this.end > this.start : true",
    ));

    // end unset: guard short-circuits to true
    let instance = MessageValue::new("acme.Span").with_field("start", Value::timestamp(100, 0));
    assert!(compiled.validate(&instance).unwrap().is_valid());

    // end set and out of order: violation
    let instance = MessageValue::new("acme.Span")
        .with_field("start", Value::timestamp(200, 0))
        .with_field("end", Value::timestamp(100, 0));
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["span.order"]);
}

#[test]
fn conditional_requirement_between_optional_fields() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Payment")
            .with_field(FieldDescriptor::new("method", 1, FieldKind::String))
            .with_field(FieldDescriptor::new("card_number", 2, FieldKind::String).optional())
            .with_cel_rule(Rule::new(
                "payment.card_number_required",
                "card payments need a card number",
                "this.method != 'card' || has(this.card_number)",
            )),
    );
    let compiled = compile_ok(schema);

    let instance = MessageValue::new("acme.Payment").with_field("method", "card");
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["payment.card_number_required"]);

    let instance = MessageValue::new("acme.Payment")
        .with_field("method", "card")
        .with_field("card_number", "4111111111111111");
    assert!(compiled.validate(&instance).unwrap().is_valid());

    let instance = MessageValue::new("acme.Payment").with_field("method", "cash");
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

// ==================== Ignore Annotations ====================

#[test]
fn ignore_always_suppresses_all_rules() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Form").with_field(
            FieldDescriptor::new("legacy", 1, FieldKind::String)
                .required()
                .ignore(Ignore::Always)
                .with_rules(FieldRules::String(Box::new(StringRules {
                    min_len: Some(5),
                    ..Default::default()
                }))),
        ),
    );
    let compiled = compile_ok(schema);

    // Empty required string with an otherwise-violating value
    let result = compiled.validate(&MessageValue::new("acme.Form")).unwrap();
    assert!(result.is_valid());

    let instance = MessageValue::new("acme.Form").with_field("legacy", "x");
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

#[test]
fn ignore_if_zero_value_skips_only_zero_values() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Form").with_field(
            FieldDescriptor::new("code", 1, FieldKind::String)
                .ignore(Ignore::IfZeroValue)
                .with_rules(FieldRules::String(Box::new(StringRules {
                    min_len: Some(5),
                    ..Default::default()
                }))),
        ),
    );
    let compiled = compile_ok(schema);

    // Zero value: rules skipped
    let instance = MessageValue::new("acme.Form").with_field("code", "");
    assert!(compiled.validate(&instance).unwrap().is_valid());

    // Non-zero value: rules apply
    let instance = MessageValue::new("acme.Form").with_field("code", "abc");
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["string.min_len"]);
}

// ==================== Field-level Expression Rules ====================

#[test]
fn field_cel_rule_binds_this_to_the_field_value() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Order").with_field(
            FieldDescriptor::new("total", 1, FieldKind::Int)
                .with_rules(FieldRules::Int(NumRules {
                    gte: Some(0),
                    ..Default::default()
                }))
                .with_cel_rule(Rule::new(
                    "total.even",
                    "total must be even",
                    "this % 2 == 0",
                )),
        ),
    );
    let compiled = compile_ok(schema);

    let instance = MessageValue::new("acme.Order").with_field("total", 7i64);
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["total.even"]);

    let instance = MessageValue::new("acme.Order").with_field("total", 8i64);
    assert!(compiled.validate(&instance).unwrap().is_valid());
}

#[test]
fn field_rules_are_skipped_on_unset_explicit_presence_fields() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Form").with_field(
            FieldDescriptor::new("nickname", 1, FieldKind::String)
                .optional()
                .with_rules(FieldRules::String(Box::new(StringRules {
                    min_len: Some(3),
                    ..Default::default()
                })))
                .with_cel_rule(Rule::new(
                    "nickname.lowercase",
                    "nickname must be lowercase",
                    "this == this.lowerAscii()",
                )),
        ),
    );
    let compiled = compile_ok(schema);

    // Unset without required: absence is not a violation
    assert!(compiled.validate(&MessageValue::new("acme.Form")).unwrap().is_valid());

    // Set: both rule layers apply
    let instance = MessageValue::new("acme.Form").with_field("nickname", "AB");
    let result = compiled.validate(&instance).unwrap();
    let ids = rule_ids(&result);
    assert!(ids.contains(&"string.min_len"));
    assert!(ids.contains(&"nickname.lowercase"));
}

// ==================== Custom Functions ====================

#[test]
fn custom_functions_extend_the_rule_expression_library() {
    use provalid_cel::eval::{Function, Overload};
    use provalid_cel::{ExprType, FunctionDecl, FunctionRegistry, OverloadDecl, Value as CelValue};
    use std::collections::HashMap;

    let mut declarations = HashMap::new();
    declarations.insert(
        "isSku".to_string(),
        FunctionDecl::new("isSku").with_overload(OverloadDecl::method(
            "string_is_sku",
            vec![ExprType::String],
            ExprType::Bool,
        )),
    );

    let mut functions = FunctionRegistry::new();
    functions.register(Function::new("isSku").with_overload(Overload::new(
        "string_is_sku",
        true,
        1,
        Arc::new(|args: &[CelValue]| match args.first() {
            Some(CelValue::String(s)) => {
                CelValue::Bool(s.len() == 8 && s.chars().all(|c| c.is_ascii_alphanumeric()))
            }
            _ => CelValue::Bool(false),
        }),
    )));

    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Product").with_field(
            FieldDescriptor::new("sku", 1, FieldKind::String).with_cel_rule(Rule::new(
                "sku.format",
                "sku must be eight alphanumerics",
                "this.isSku()",
            )),
        ),
    );
    let compiled = provalid::compile_with_functions(schema, declarations, functions)
        .expect("schema should compile");

    let instance = MessageValue::new("acme.Product").with_field("sku", "AB12CD34");
    assert!(compiled.validate(&instance).unwrap().is_valid());

    let instance = MessageValue::new("acme.Product").with_field("sku", "nope");
    let result = compiled.validate(&instance).unwrap();
    assert_eq!(rule_ids(&result), vec!["sku.format"]);
}

#[test]
fn unknown_custom_function_is_still_a_schema_error() {
    let schema = SchemaSet::new().with_message(
        MessageDescriptor::new("acme.Product").with_field(
            FieldDescriptor::new("sku", 1, FieldKind::String).with_cel_rule(Rule::new(
                "sku.format",
                "sku must validate",
                "this.isSku()",
            )),
        ),
    );
    assert!(compile(schema).is_err());
}

// ==================== Unknown Types ====================

#[test]
fn validating_an_unknown_type_is_a_programmer_error() {
    let compiled = compile_ok(user_schema());
    let err = compiled
        .validate(&MessageValue::new("acme.Unknown"))
        .unwrap_err();
    assert!(err.to_string().contains("acme.Unknown"));
}
