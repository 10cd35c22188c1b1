//! Tree-walking evaluator for constraint expressions.
//!
//! The evaluator performs depth-first traversal of the AST, evaluating
//! each node to a `Value`. Errors are values: a failing subexpression
//! produces `Value::Error` and propagates outward without panicking, so
//! evaluation is total for any bound expression.
//!
//! `&&`, `||`, and the ternary operator short-circuit. Logical operators
//! are commutative with respect to errors: `false && error` is `false`
//! and `true || error` is `true`.

use std::sync::Arc;

use super::{
    Activation, Duration, EvalError, FunctionRegistry, MapKey, Timestamp, Value, ValueMap,
};
use crate::ast::{BinaryOp, Expr, SpannedExpr, UnaryOp};

/// The expression evaluator.
///
/// Evaluates a bound AST against an activation (variable bindings) and a
/// function registry. Holds only borrows; construction is free.
pub struct Evaluator<'a> {
    activation: &'a dyn Activation,
    functions: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    /// Create a new evaluator.
    pub fn new(activation: &'a dyn Activation, functions: &'a FunctionRegistry) -> Self {
        Self {
            activation,
            functions,
        }
    }

    /// Evaluate an expression.
    pub fn eval(&self, expr: &SpannedExpr) -> Value {
        self.eval_expr(expr)
    }

    fn eval_expr(&self, expr: &SpannedExpr) -> Value {
        match &expr.node {
            // Literals
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::UInt(u) => Value::UInt(*u),
            Expr::Double(d) => Value::Double(*d),
            Expr::String(s) => Value::String(Arc::from(s.as_str())),
            Expr::Bytes(b) => Value::Bytes(Arc::from(b.as_slice())),

            Expr::Ident(name) => self.eval_ident(name),

            Expr::List(elements) => self.eval_list(elements),
            Expr::Map(entries) => self.eval_map(entries),

            Expr::Unary { op, expr } => self.eval_unary(*op, expr),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.eval_ternary(cond, then_expr, else_expr),

            Expr::Member { expr, field } => self.eval_member(expr, field),
            Expr::Index { expr, index } => self.eval_index(expr, index),
            Expr::Call {
                target,
                function,
                args,
            } => self.eval_call(target.as_deref(), function, args),

            Expr::Has { expr, field } => self.eval_has(expr, field),
        }
    }

    fn eval_ident(&self, name: &str) -> Value {
        self.activation
            .resolve(name)
            .unwrap_or_else(|| Value::error(EvalError::unknown_identifier(name)))
    }

    fn eval_list(&self, elements: &[SpannedExpr]) -> Value {
        let mut values = Vec::with_capacity(elements.len());

        for elem in elements {
            let value = self.eval_expr(elem);
            if value.is_error() {
                return value;
            }
            values.push(value);
        }

        Value::List(Arc::from(values))
    }

    fn eval_map(&self, entries: &[(SpannedExpr, SpannedExpr)]) -> Value {
        let mut map = ValueMap::new();

        for (key_expr, value_expr) in entries {
            let key = self.eval_expr(key_expr);
            if key.is_error() {
                return key;
            }

            let value = self.eval_expr(value_expr);
            if value.is_error() {
                return value;
            }

            match MapKey::from_value(&key) {
                Some(map_key) => map.insert(map_key, value),
                None => {
                    return Value::error(EvalError::type_mismatch(
                        "valid map key",
                        key.type_name(),
                    ))
                }
            }
        }

        Value::Map(Arc::new(map))
    }

    // ==================== Unary ====================

    fn eval_unary(&self, op: UnaryOp, expr: &SpannedExpr) -> Value {
        let value = self.eval_expr(expr);
        if value.is_error() {
            return value;
        }

        match op {
            UnaryOp::Neg => match value {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .unwrap_or_else(|| Value::error(EvalError::overflow("integer negation overflow"))),
                Value::Double(d) => Value::Double(-d),
                _ => Value::error(EvalError::type_mismatch("int or double", value.type_name())),
            },
            UnaryOp::Not => match value {
                Value::Bool(b) => Value::Bool(!b),
                _ => Value::error(EvalError::type_mismatch("bool", value.type_name())),
            },
        }
    }

    // ==================== Binary ====================

    fn eval_binary(&self, op: BinaryOp, left: &SpannedExpr, right: &SpannedExpr) -> Value {
        // Short-circuit evaluation for && and ||
        match op {
            BinaryOp::And => return self.eval_and(left, right),
            BinaryOp::Or => return self.eval_or(left, right),
            _ => {}
        }

        let left_val = self.eval_expr(left);
        if left_val.is_error() {
            return left_val;
        }

        let right_val = self.eval_expr(right);
        if right_val.is_error() {
            return right_val;
        }

        match op {
            BinaryOp::Add => self.eval_add(left_val, right_val),
            BinaryOp::Sub => self.eval_sub(left_val, right_val),
            BinaryOp::Mul => self.eval_mul(left_val, right_val),
            BinaryOp::Div => self.eval_div(left_val, right_val),
            BinaryOp::Mod => self.eval_mod(left_val, right_val),
            BinaryOp::Eq => Value::Bool(left_val == right_val),
            BinaryOp::Ne => Value::Bool(left_val != right_val),
            BinaryOp::Lt => self.eval_compare(left_val, right_val, |o| o.is_lt()),
            BinaryOp::Le => self.eval_compare(left_val, right_val, |o| o.is_le()),
            BinaryOp::Gt => self.eval_compare(left_val, right_val, |o| o.is_gt()),
            BinaryOp::Ge => self.eval_compare(left_val, right_val, |o| o.is_ge()),
            BinaryOp::In => self.eval_in(left_val, right_val),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_and(&self, left: &SpannedExpr, right: &SpannedExpr) -> Value {
        let left_val = self.eval_expr(left);

        match &left_val {
            Value::Bool(false) => return Value::Bool(false),
            Value::Bool(true) => {}
            Value::Error(_) => {
                // Commutative error handling: false on either side wins
                let right_val = self.eval_expr(right);
                return match right_val {
                    Value::Bool(false) => Value::Bool(false),
                    _ => left_val,
                };
            }
            _ => {
                return Value::error(EvalError::type_mismatch("bool", left_val.type_name()));
            }
        }

        let right_val = self.eval_expr(right);
        match &right_val {
            Value::Bool(_) | Value::Error(_) => right_val,
            _ => Value::error(EvalError::type_mismatch("bool", right_val.type_name())),
        }
    }

    fn eval_or(&self, left: &SpannedExpr, right: &SpannedExpr) -> Value {
        let left_val = self.eval_expr(left);

        match &left_val {
            Value::Bool(true) => return Value::Bool(true),
            Value::Bool(false) => {}
            Value::Error(_) => {
                let right_val = self.eval_expr(right);
                return match right_val {
                    Value::Bool(true) => Value::Bool(true),
                    _ => left_val,
                };
            }
            _ => {
                return Value::error(EvalError::type_mismatch("bool", left_val.type_name()));
            }
        }

        let right_val = self.eval_expr(right);
        match &right_val {
            Value::Bool(_) | Value::Error(_) => right_val,
            _ => Value::error(EvalError::type_mismatch("bool", right_val.type_name())),
        }
    }

    fn eval_ternary(
        &self,
        cond: &SpannedExpr,
        then_expr: &SpannedExpr,
        else_expr: &SpannedExpr,
    ) -> Value {
        let cond_val = self.eval_expr(cond);
        match cond_val {
            Value::Bool(true) => self.eval_expr(then_expr),
            Value::Bool(false) => self.eval_expr(else_expr),
            Value::Error(_) => cond_val,
            _ => Value::error(EvalError::type_mismatch("bool", cond_val.type_name())),
        }
    }

    fn eval_add(&self, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .unwrap_or_else(|| Value::error(EvalError::overflow("integer addition overflow"))),
            (Value::UInt(a), Value::UInt(b)) => a
                .checked_add(*b)
                .map(Value::UInt)
                .unwrap_or_else(|| Value::error(EvalError::overflow("unsigned addition overflow"))),
            (Value::Double(a), Value::Double(b)) => Value::Double(a + b),
            (Value::String(a), Value::String(b)) => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Value::string(s)
            }
            (Value::Bytes(a), Value::Bytes(b)) => {
                let mut v = Vec::with_capacity(a.len() + b.len());
                v.extend_from_slice(a);
                v.extend_from_slice(b);
                Value::bytes(v)
            }
            (Value::List(a), Value::List(b)) => {
                let mut v = Vec::with_capacity(a.len() + b.len());
                v.extend_from_slice(a);
                v.extend_from_slice(b);
                Value::List(Arc::from(v))
            }
            (Value::Timestamp(t), Value::Duration(d)) | (Value::Duration(d), Value::Timestamp(t)) => {
                add_timestamp_duration(*t, *d)
            }
            (Value::Duration(a), Value::Duration(b)) => {
                match a.to_nanos().checked_add(b.to_nanos()) {
                    Some(n) => Value::Duration(Duration::from_nanos(n)),
                    None => Value::error(EvalError::overflow("duration addition overflow")),
                }
            }
            _ => Value::error(EvalError::no_matching_overload("_+_")),
        }
    }

    fn eval_sub(&self, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_sub(*b)
                .map(Value::Int)
                .unwrap_or_else(|| Value::error(EvalError::overflow("integer subtraction overflow"))),
            (Value::UInt(a), Value::UInt(b)) => a
                .checked_sub(*b)
                .map(Value::UInt)
                .unwrap_or_else(|| Value::error(EvalError::overflow("unsigned subtraction overflow"))),
            (Value::Double(a), Value::Double(b)) => Value::Double(a - b),
            (Value::Timestamp(a), Value::Timestamp(b)) => {
                let nanos = (a.seconds - b.seconds)
                    .checked_mul(1_000_000_000)
                    .and_then(|n| n.checked_add((a.nanos - b.nanos) as i64));
                match nanos {
                    Some(n) => Value::Duration(Duration::from_nanos(n)),
                    None => Value::error(EvalError::overflow("timestamp difference overflow")),
                }
            }
            (Value::Timestamp(t), Value::Duration(d)) => {
                add_timestamp_duration(*t, Duration::from_nanos(-d.to_nanos()))
            }
            (Value::Duration(a), Value::Duration(b)) => {
                match a.to_nanos().checked_sub(b.to_nanos()) {
                    Some(n) => Value::Duration(Duration::from_nanos(n)),
                    None => Value::error(EvalError::overflow("duration subtraction overflow")),
                }
            }
            _ => Value::error(EvalError::no_matching_overload("_-_")),
        }
    }

    fn eval_mul(&self, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(*b)
                .map(Value::Int)
                .unwrap_or_else(|| Value::error(EvalError::overflow("integer multiplication overflow"))),
            (Value::UInt(a), Value::UInt(b)) => a
                .checked_mul(*b)
                .map(Value::UInt)
                .unwrap_or_else(|| {
                    Value::error(EvalError::overflow("unsigned multiplication overflow"))
                }),
            (Value::Double(a), Value::Double(b)) => Value::Double(a * b),
            _ => Value::error(EvalError::no_matching_overload("_*_")),
        }
    }

    fn eval_div(&self, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Int(_), Value::Int(0)) | (Value::UInt(_), Value::UInt(0)) => {
                Value::error(EvalError::division_by_zero())
            }
            (Value::Int(a), Value::Int(b)) => a
                .checked_div(*b)
                .map(Value::Int)
                .unwrap_or_else(|| Value::error(EvalError::overflow("integer division overflow"))),
            (Value::UInt(a), Value::UInt(b)) => Value::UInt(a / b),
            // IEEE 754: x / 0.0 is infinity, not an error
            (Value::Double(a), Value::Double(b)) => Value::Double(a / b),
            _ => Value::error(EvalError::no_matching_overload("_/_")),
        }
    }

    fn eval_mod(&self, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Int(_), Value::Int(0)) | (Value::UInt(_), Value::UInt(0)) => {
                Value::error(EvalError::modulo_by_zero())
            }
            (Value::Int(a), Value::Int(b)) => a
                .checked_rem(*b)
                .map(Value::Int)
                .unwrap_or_else(|| Value::error(EvalError::overflow("integer remainder overflow"))),
            (Value::UInt(a), Value::UInt(b)) => Value::UInt(a % b),
            _ => Value::error(EvalError::no_matching_overload("_%_")),
        }
    }

    fn eval_compare(
        &self,
        left: Value,
        right: Value,
        test: impl Fn(std::cmp::Ordering) -> bool,
    ) -> Value {
        match left.compare(&right) {
            Some(ordering) => Value::Bool(test(ordering)),
            None => Value::error(EvalError::no_matching_overload("comparison")),
        }
    }

    fn eval_in(&self, needle: Value, haystack: Value) -> Value {
        match &haystack {
            Value::List(items) => Value::Bool(items.iter().any(|item| *item == needle)),
            Value::Map(map) => match MapKey::from_value(&needle) {
                Some(key) => Value::Bool(map.contains_key(&key)),
                None => Value::Bool(false),
            },
            _ => Value::error(EvalError::type_mismatch("list or map", haystack.type_name())),
        }
    }

    // ==================== Access ====================

    fn eval_member(&self, expr: &SpannedExpr, field: &str) -> Value {
        let value = self.eval_expr(expr);
        if value.is_error() {
            return value;
        }

        match &value {
            Value::Message(msg) => match msg.field(field) {
                Some(v) => v.clone(),
                // Unset fields read as errors; rules that might read unset
                // fields guard with has() or are skipped by the validator.
                None => Value::error(EvalError::field_not_set(field)),
            },
            Value::Map(map) => {
                let key = MapKey::String(Arc::from(field));
                match map.get(&key) {
                    Some(v) => v.clone(),
                    None => Value::error(EvalError::key_not_found(field)),
                }
            }
            _ => Value::error(EvalError::type_mismatch("message or map", value.type_name())),
        }
    }

    fn eval_index(&self, expr: &SpannedExpr, index: &SpannedExpr) -> Value {
        let value = self.eval_expr(expr);
        if value.is_error() {
            return value;
        }

        let index_val = self.eval_expr(index);
        if index_val.is_error() {
            return index_val;
        }

        match &value {
            Value::List(items) => {
                let i = match &index_val {
                    Value::Int(i) => *i,
                    Value::UInt(u) => *u as i64,
                    _ => {
                        return Value::error(EvalError::type_mismatch(
                            "int index",
                            index_val.type_name(),
                        ))
                    }
                };
                if i < 0 || i as usize >= items.len() {
                    Value::error(EvalError::index_out_of_bounds(i, items.len()))
                } else {
                    items[i as usize].clone()
                }
            }
            Value::Map(map) => match MapKey::from_value(&index_val) {
                Some(key) => match map.get(&key) {
                    Some(v) => v.clone(),
                    None => Value::error(EvalError::key_not_found(&key.to_string())),
                },
                None => Value::error(EvalError::type_mismatch(
                    "valid map key",
                    index_val.type_name(),
                )),
            },
            _ => Value::error(EvalError::type_mismatch("list or map", value.type_name())),
        }
    }

    fn eval_call(
        &self,
        target: Option<&SpannedExpr>,
        function: &str,
        args: &[SpannedExpr],
    ) -> Value {
        let is_member = target.is_some();
        let mut arg_values = Vec::with_capacity(args.len() + 1);

        if let Some(receiver) = target {
            let value = self.eval_expr(receiver);
            if value.is_error() {
                return value;
            }
            arg_values.push(value);
        }

        for arg in args {
            let value = self.eval_expr(arg);
            if value.is_error() {
                return value;
            }
            arg_values.push(value);
        }

        match self.functions.find(function, arg_values.len(), is_member) {
            Some(overload) => overload.call(&arg_values),
            None if self.functions.contains(function) => {
                Value::error(EvalError::no_matching_overload(function))
            }
            None => Value::error(EvalError::unknown_function(function)),
        }
    }

    /// `has(expr.field)` presence test.
    ///
    /// On messages: true when the field is set, with list- and map-typed
    /// fields additionally required to be non-empty. On maps: key
    /// presence. Never an error for missing fields.
    fn eval_has(&self, expr: &SpannedExpr, field: &str) -> Value {
        let value = self.eval_expr(expr);
        if value.is_error() {
            return value;
        }

        match &value {
            Value::Message(msg) => match msg.field(field) {
                Some(Value::List(l)) => Value::Bool(!l.is_empty()),
                Some(Value::Map(m)) => Value::Bool(!m.is_empty()),
                Some(_) => Value::Bool(true),
                None => Value::Bool(false),
            },
            Value::Map(map) => {
                let key = MapKey::String(Arc::from(field));
                Value::Bool(map.contains_key(&key))
            }
            _ => Value::error(EvalError::type_mismatch("message or map", value.type_name())),
        }
    }
}

/// Timestamp plus duration with overflow checking.
fn add_timestamp_duration(t: Timestamp, d: Duration) -> Value {
    let mut seconds = match t.seconds.checked_add(d.seconds) {
        Some(s) => s,
        None => return Value::error(EvalError::overflow("timestamp arithmetic overflow")),
    };
    let mut nanos = t.nanos + d.nanos;

    if nanos >= 1_000_000_000 {
        nanos -= 1_000_000_000;
        seconds = match seconds.checked_add(1) {
            Some(s) => s,
            None => return Value::error(EvalError::overflow("timestamp arithmetic overflow")),
        };
    } else if nanos < 0 {
        nanos += 1_000_000_000;
        seconds = match seconds.checked_sub(1) {
            Some(s) => s,
            None => return Value::error(EvalError::overflow("timestamp arithmetic overflow")),
        };
    }

    Value::Timestamp(Timestamp::new(seconds, nanos))
}
