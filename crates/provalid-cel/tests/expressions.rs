//! End-to-end expression behavior: parse, bind, evaluate.

use std::collections::HashMap;
use std::sync::Arc;

use provalid_cel::bind::{bind_predicate, EmptyTypeProvider, FieldTypeProvider};
use provalid_cel::ext::{format_registry, FORMAT_DECLARATIONS};
use provalid_cel::stdlib::{standard_registry, STANDARD_DECLARATIONS};
use provalid_cel::{
    parse, ExprType, FunctionDecl, MapActivation, MessageValue, Program, Value,
};

fn declarations() -> HashMap<String, FunctionDecl> {
    let mut decls = STANDARD_DECLARATIONS.clone();
    decls.extend(FORMAT_DECLARATIONS.iter().map(|(k, v)| (k.clone(), v.clone())));
    decls
}

fn registry() -> provalid_cel::FunctionRegistry {
    let mut registry = standard_registry();
    registry.merge(format_registry());
    registry
}

struct UserProvider;

impl FieldTypeProvider for UserProvider {
    fn field_type(&self, message: &str, field: &str) -> Option<ExprType> {
        match (message, field) {
            ("acme.User", "email") => Some(ExprType::String),
            ("acme.User", "age") => Some(ExprType::Int),
            ("acme.User", "scores") => Some(ExprType::list(ExprType::Int)),
            _ => None,
        }
    }
}

/// Compile a predicate over `this: acme.User` and evaluate it against an
/// instance, the way the engine drives the crate.
fn check_user(source: &str, user: MessageValue) -> Value {
    let expr = parse(source).expect("parse");

    let mut vars = HashMap::new();
    vars.insert("this".to_string(), ExprType::message("acme.User"));
    vars.insert("now".to_string(), ExprType::Timestamp);

    let bound = bind_predicate(&expr, &vars, &declarations(), &UserProvider);
    assert!(bound.is_ok(), "bind errors: {:?}", bound.errors);

    let program = Program::new(Arc::new(expr), Arc::new(registry()));
    let activation = MapActivation::new()
        .with_binding("this", user)
        .with_binding("now", Value::timestamp(1_700_000_000, 0));
    program.eval(&activation)
}

#[test]
fn field_predicate_over_a_message() {
    let user = MessageValue::new("acme.User")
        .with_field("email", "ada@example.com")
        .with_field("age", 36i64);

    assert_eq!(
        check_user("this.email.isEmail() && this.age >= 18", user),
        Value::Bool(true)
    );
}

#[test]
fn predicate_failure_is_false_not_error() {
    let user = MessageValue::new("acme.User")
        .with_field("email", "nope")
        .with_field("age", 36i64);

    assert_eq!(check_user("this.email.isEmail()", user), Value::Bool(false));
}

#[test]
fn has_guard_avoids_reading_unset_fields() {
    let user = MessageValue::new("acme.User").with_field("age", 36i64);

    assert_eq!(
        check_user("has(this.email) ? this.email.isEmail() : true", user),
        Value::Bool(true)
    );
}

#[test]
fn list_membership_and_size() {
    let user = MessageValue::new("acme.User").with_field(
        "scores",
        Value::list(vec![Value::Int(10), Value::Int(20)]),
    );

    assert_eq!(
        check_user("size(this.scores) == 2 && 10 in this.scores", user),
        Value::Bool(true)
    );
}

#[test]
fn unique_over_a_list_field() {
    let user = MessageValue::new("acme.User").with_field(
        "scores",
        Value::list(vec![Value::Int(10), Value::Int(10)]),
    );

    assert_eq!(check_user("this.scores.unique()", user), Value::Bool(false));
}

#[test]
fn stdlib_and_format_registries_compose() {
    let expr = parse("'10.0.0.1'.isIp(4) && 'abc'.size() == 3").expect("parse");
    let bound = bind_predicate(&expr, &HashMap::new(), &declarations(), &EmptyTypeProvider);
    assert!(bound.is_ok(), "bind errors: {:?}", bound.errors);

    let program = Program::new(Arc::new(expr), Arc::new(registry()));
    assert_eq!(program.eval_empty(), Value::Bool(true));
}

#[test]
fn binder_rejects_what_evaluation_would_choke_on() {
    let mut vars = HashMap::new();
    vars.insert("this".to_string(), ExprType::message("acme.User"));

    for source in [
        "this.unknown_field > 0",
        "frobnicate(this)",
        "this.age.isEmail()",
        "this.age + ''",
    ] {
        let expr = parse(source).expect("parse");
        let bound = bind_predicate(&expr, &vars, &declarations(), &UserProvider);
        assert!(!bound.is_ok(), "{} should not bind", source);
    }
}
