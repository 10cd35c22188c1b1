//! Standard library for constraint expressions.
//!
//! Declares and implements the built-in named functions. Operators are
//! evaluated structurally by the evaluator; only named functions go
//! through the registry. Overload IDs follow cel-go conventions
//! (`size_string`, `string_contains_string`, ...).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::eval::time::{parse_duration, parse_timestamp};
use crate::eval::{EvalError, Function, FunctionRegistry, Overload, Value};
use crate::types::{ExprType, FunctionDecl, OverloadDecl};

/// Standard library function declarations, used by the binder.
pub static STANDARD_DECLARATIONS: LazyLock<HashMap<String, FunctionDecl>> =
    LazyLock::new(build_standard_declarations);

fn build_standard_declarations() -> HashMap<String, FunctionDecl> {
    let mut funcs = Vec::new();

    // ==================== Size ====================

    funcs.push(
        FunctionDecl::new("size")
            .with_overload(OverloadDecl::function(
                "size_string",
                vec![ExprType::String],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::function(
                "size_bytes",
                vec![ExprType::Bytes],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::function(
                "size_list",
                vec![ExprType::list(ExprType::Dyn)],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::function(
                "size_map",
                vec![ExprType::map(ExprType::Dyn, ExprType::Dyn)],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::method(
                "string_size",
                vec![ExprType::String],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::method(
                "bytes_size",
                vec![ExprType::Bytes],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::method(
                "list_size",
                vec![ExprType::list(ExprType::Dyn)],
                ExprType::Int,
            ))
            .with_overload(OverloadDecl::method(
                "map_size",
                vec![ExprType::map(ExprType::Dyn, ExprType::Dyn)],
                ExprType::Int,
            )),
    );

    // ==================== String Predicates ====================

    funcs.push(FunctionDecl::new("contains").with_overload(OverloadDecl::method(
        "string_contains_string",
        vec![ExprType::String, ExprType::String],
        ExprType::Bool,
    )));
    funcs.push(FunctionDecl::new("startsWith").with_overload(OverloadDecl::method(
        "string_starts_with_string",
        vec![ExprType::String, ExprType::String],
        ExprType::Bool,
    )));
    funcs.push(FunctionDecl::new("endsWith").with_overload(OverloadDecl::method(
        "string_ends_with_string",
        vec![ExprType::String, ExprType::String],
        ExprType::Bool,
    )));
    funcs.push(
        FunctionDecl::new("matches")
            .with_overload(OverloadDecl::function(
                "matches_string_re",
                vec![ExprType::String, ExprType::String],
                ExprType::Bool,
            ))
            .with_overload(OverloadDecl::method(
                "string_matches_re",
                vec![ExprType::String, ExprType::String],
                ExprType::Bool,
            )),
    );

    // ==================== String Transforms ====================

    funcs.push(FunctionDecl::new("lowerAscii").with_overload(OverloadDecl::method(
        "string_lower_ascii",
        vec![ExprType::String],
        ExprType::String,
    )));
    funcs.push(FunctionDecl::new("upperAscii").with_overload(OverloadDecl::method(
        "string_upper_ascii",
        vec![ExprType::String],
        ExprType::String,
    )));
    funcs.push(FunctionDecl::new("trim").with_overload(OverloadDecl::method(
        "string_trim",
        vec![ExprType::String],
        ExprType::String,
    )));

    // ==================== Conversions ====================

    funcs.push(
        FunctionDecl::new("int")
            .with_overload(OverloadDecl::function("int64_to_int64", vec![ExprType::Int], ExprType::Int))
            .with_overload(OverloadDecl::function("uint64_to_int64", vec![ExprType::UInt], ExprType::Int))
            .with_overload(OverloadDecl::function("double_to_int64", vec![ExprType::Double], ExprType::Int))
            .with_overload(OverloadDecl::function("string_to_int64", vec![ExprType::String], ExprType::Int))
            .with_overload(OverloadDecl::function("timestamp_to_int64", vec![ExprType::Timestamp], ExprType::Int)),
    );
    funcs.push(
        FunctionDecl::new("uint")
            .with_overload(OverloadDecl::function("uint64_to_uint64", vec![ExprType::UInt], ExprType::UInt))
            .with_overload(OverloadDecl::function("int64_to_uint64", vec![ExprType::Int], ExprType::UInt))
            .with_overload(OverloadDecl::function("double_to_uint64", vec![ExprType::Double], ExprType::UInt))
            .with_overload(OverloadDecl::function("string_to_uint64", vec![ExprType::String], ExprType::UInt)),
    );
    funcs.push(
        FunctionDecl::new("double")
            .with_overload(OverloadDecl::function("double_to_double", vec![ExprType::Double], ExprType::Double))
            .with_overload(OverloadDecl::function("int64_to_double", vec![ExprType::Int], ExprType::Double))
            .with_overload(OverloadDecl::function("uint64_to_double", vec![ExprType::UInt], ExprType::Double))
            .with_overload(OverloadDecl::function("string_to_double", vec![ExprType::String], ExprType::Double)),
    );
    funcs.push(
        FunctionDecl::new("string")
            .with_overload(OverloadDecl::function("string_to_string", vec![ExprType::String], ExprType::String))
            .with_overload(OverloadDecl::function("int64_to_string", vec![ExprType::Int], ExprType::String))
            .with_overload(OverloadDecl::function("uint64_to_string", vec![ExprType::UInt], ExprType::String))
            .with_overload(OverloadDecl::function("double_to_string", vec![ExprType::Double], ExprType::String))
            .with_overload(OverloadDecl::function("bool_to_string", vec![ExprType::Bool], ExprType::String))
            .with_overload(OverloadDecl::function("bytes_to_string", vec![ExprType::Bytes], ExprType::String)),
    );

    // ==================== Time Constructors ====================

    funcs.push(FunctionDecl::new("timestamp").with_overload(OverloadDecl::function(
        "string_to_timestamp",
        vec![ExprType::String],
        ExprType::Timestamp,
    )));
    funcs.push(FunctionDecl::new("duration").with_overload(OverloadDecl::function(
        "string_to_duration",
        vec![ExprType::String],
        ExprType::Duration,
    )));

    funcs.into_iter().map(|f| (f.name.clone(), f)).collect()
}

/// Build the standard function registry for evaluation.
pub fn standard_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();

    registry.register(
        Function::new("size")
            .with_overload(Overload::new("size_value", false, 1, Arc::new(size_impl)))
            .with_overload(Overload::new("value_size", true, 1, Arc::new(size_impl))),
    );

    registry.register(Function::new("contains").with_overload(Overload::new(
        "string_contains_string",
        true,
        2,
        Arc::new(|args| string_pair(args, "contains", |s, sub| s.contains(sub))),
    )));
    registry.register(Function::new("startsWith").with_overload(Overload::new(
        "string_starts_with_string",
        true,
        2,
        Arc::new(|args| string_pair(args, "startsWith", |s, prefix| s.starts_with(prefix))),
    )));
    registry.register(Function::new("endsWith").with_overload(Overload::new(
        "string_ends_with_string",
        true,
        2,
        Arc::new(|args| string_pair(args, "endsWith", |s, suffix| s.ends_with(suffix))),
    )));

    registry.register(
        Function::new("matches")
            .with_overload(Overload::new("matches_string_re", false, 2, Arc::new(matches_impl)))
            .with_overload(Overload::new("string_matches_re", true, 2, Arc::new(matches_impl))),
    );

    registry.register(Function::new("lowerAscii").with_overload(Overload::new(
        "string_lower_ascii",
        true,
        1,
        Arc::new(|args| string_transform(args, "lowerAscii", |s| s.to_ascii_lowercase())),
    )));
    registry.register(Function::new("upperAscii").with_overload(Overload::new(
        "string_upper_ascii",
        true,
        1,
        Arc::new(|args| string_transform(args, "upperAscii", |s| s.to_ascii_uppercase())),
    )));
    registry.register(Function::new("trim").with_overload(Overload::new(
        "string_trim",
        true,
        1,
        Arc::new(|args| string_transform(args, "trim", |s| s.trim().to_string())),
    )));

    registry.register(
        Function::new("int").with_overload(Overload::new("to_int", false, 1, Arc::new(int_impl))),
    );
    registry.register(
        Function::new("uint").with_overload(Overload::new("to_uint", false, 1, Arc::new(uint_impl))),
    );
    registry.register(
        Function::new("double")
            .with_overload(Overload::new("to_double", false, 1, Arc::new(double_impl))),
    );
    registry.register(
        Function::new("string")
            .with_overload(Overload::new("to_string", false, 1, Arc::new(string_impl))),
    );

    registry.register(Function::new("timestamp").with_overload(Overload::new(
        "string_to_timestamp",
        false,
        1,
        Arc::new(timestamp_impl),
    )));
    registry.register(Function::new("duration").with_overload(Overload::new(
        "string_to_duration",
        false,
        1,
        Arc::new(duration_impl),
    )));

    registry
}

// ==================== Implementations ====================

fn size_impl(args: &[Value]) -> Value {
    match args.first() {
        // String size counts Unicode code points, not bytes
        Some(Value::String(s)) => Value::Int(s.chars().count() as i64),
        Some(Value::Bytes(b)) => Value::Int(b.len() as i64),
        Some(Value::List(l)) => Value::Int(l.len() as i64),
        Some(Value::Map(m)) => Value::Int(m.len() as i64),
        Some(_) => Value::error(EvalError::no_matching_overload("size")),
        None => Value::error(EvalError::invalid_argument("size requires an argument")),
    }
}

fn string_pair(args: &[Value], name: &str, test: impl Fn(&str, &str) -> bool) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(s)), Some(Value::String(arg))) => Value::Bool(test(s, arg)),
        _ => Value::error(EvalError::no_matching_overload(name)),
    }
}

fn string_transform(args: &[Value], name: &str, transform: impl Fn(&str) -> String) -> Value {
    match args.first() {
        Some(Value::String(s)) => Value::string(transform(s)),
        _ => Value::error(EvalError::no_matching_overload(name)),
    }
}

fn matches_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(s)), Some(Value::String(pattern))) => {
            match regex::Regex::new(pattern) {
                Ok(re) => Value::Bool(re.is_match(s)),
                Err(e) => Value::error(EvalError::invalid_argument(format!(
                    "invalid regex pattern: {}",
                    e
                ))),
            }
        }
        _ => Value::error(EvalError::no_matching_overload("matches")),
    }
}

fn int_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Int(i)) => Value::Int(*i),
        Some(Value::UInt(u)) => {
            if *u <= i64::MAX as u64 {
                Value::Int(*u as i64)
            } else {
                Value::error(EvalError::overflow("uint out of int range"))
            }
        }
        Some(Value::Double(d)) => {
            if d.is_finite() && *d >= i64::MIN as f64 && *d <= i64::MAX as f64 {
                Value::Int(*d as i64)
            } else {
                Value::error(EvalError::overflow("double out of int range"))
            }
        }
        Some(Value::String(s)) => match s.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::error(EvalError::invalid_conversion("string", "int")),
        },
        Some(Value::Timestamp(t)) => Value::Int(t.seconds),
        Some(other) => Value::error(EvalError::invalid_conversion(other.type_name(), "int")),
        None => Value::error(EvalError::invalid_argument("int requires an argument")),
    }
}

fn uint_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::UInt(u)) => Value::UInt(*u),
        Some(Value::Int(i)) => {
            if *i >= 0 {
                Value::UInt(*i as u64)
            } else {
                Value::error(EvalError::overflow("negative int out of uint range"))
            }
        }
        Some(Value::Double(d)) => {
            if d.is_finite() && *d >= 0.0 && *d <= u64::MAX as f64 {
                Value::UInt(*d as u64)
            } else {
                Value::error(EvalError::overflow("double out of uint range"))
            }
        }
        Some(Value::String(s)) => match s.parse::<u64>() {
            Ok(u) => Value::UInt(u),
            Err(_) => Value::error(EvalError::invalid_conversion("string", "uint")),
        },
        Some(other) => Value::error(EvalError::invalid_conversion(other.type_name(), "uint")),
        None => Value::error(EvalError::invalid_argument("uint requires an argument")),
    }
}

fn double_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Double(d)) => Value::Double(*d),
        Some(Value::Int(i)) => Value::Double(*i as f64),
        Some(Value::UInt(u)) => Value::Double(*u as f64),
        Some(Value::String(s)) => match s.parse::<f64>() {
            Ok(d) => Value::Double(d),
            Err(_) => Value::error(EvalError::invalid_conversion("string", "double")),
        },
        Some(other) => Value::error(EvalError::invalid_conversion(other.type_name(), "double")),
        None => Value::error(EvalError::invalid_argument("double requires an argument")),
    }
}

fn string_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Int(i)) => Value::string(i.to_string()),
        Some(Value::UInt(u)) => Value::string(u.to_string()),
        Some(Value::Double(d)) => Value::string(d.to_string()),
        Some(Value::Bool(b)) => Value::string(b.to_string()),
        Some(Value::Bytes(b)) => match std::str::from_utf8(b) {
            Ok(s) => Value::string(s),
            Err(_) => Value::error(EvalError::invalid_conversion("bytes", "string")),
        },
        Some(other) => Value::error(EvalError::invalid_conversion(other.type_name(), "string")),
        None => Value::error(EvalError::invalid_argument("string requires an argument")),
    }
}

fn timestamp_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::String(s)) => match parse_timestamp(s) {
            Ok(ts) => Value::Timestamp(ts),
            Err(e) => Value::error(EvalError::invalid_argument(e)),
        },
        Some(Value::Timestamp(t)) => Value::Timestamp(*t),
        _ => Value::error(EvalError::no_matching_overload("timestamp")),
    }
}

fn duration_impl(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::String(s)) => match parse_duration(s) {
            Ok(d) => Value::Duration(d),
            Err(e) => Value::error(EvalError::invalid_argument(e)),
        },
        Some(Value::Duration(d)) => Value::Duration(*d),
        _ => Value::error(EvalError::no_matching_overload("duration")),
    }
}
