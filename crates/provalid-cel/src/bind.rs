//! Compile-time expression binding.
//!
//! Binding happens once, at schema load: every identifier is resolved
//! against the declared variables, member accesses on message-typed
//! values are resolved through a [`FieldTypeProvider`], and calls are
//! checked against the function declarations. A malformed expression is
//! a configuration error surfaced here, never during per-instance
//! evaluation.
//!
//! The checker is deliberately loose where types are unknown (`Dyn`
//! unifies with everything); it exists to reject expressions that can
//! never evaluate cleanly, not to prove every expression well-typed.

use std::collections::HashMap;

use crate::ast::{BinaryOp, Expr, Span, SpannedExpr, UnaryOp};
use crate::types::{ExprType, FunctionDecl, OverloadDecl};

/// Resolves field types on message-typed values during binding.
///
/// Implemented by the schema layer on top of its message descriptors.
pub trait FieldTypeProvider {
    /// The type of `field` on the message type `message`, or `None` if
    /// the field does not exist.
    fn field_type(&self, message: &str, field: &str) -> Option<ExprType>;
}

/// A provider that knows no message types. Member access on messages
/// binds as an unknown-field error.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTypeProvider;

impl FieldTypeProvider for EmptyTypeProvider {
    fn field_type(&self, _message: &str, _field: &str) -> Option<ExprType> {
        None
    }
}

/// A binding error with span information.
#[derive(Debug, Clone, PartialEq)]
pub struct BindError {
    pub message: String,
    pub span: Span,
    pub kind: BindErrorKind,
}

/// The kind of binding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindErrorKind {
    /// Reference to a variable that is not declared.
    UndeclaredReference,
    /// Reference to a field that does not exist on the message type.
    UnknownField,
    /// Call of a function that is not declared.
    UnknownFunction,
    /// No overload matches the call shape.
    NoMatchingOverload,
    /// Operand or argument types cannot work at runtime.
    TypeMismatch,
    /// The expression does not produce a bool.
    NotAPredicate,
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

/// Result of binding an expression.
#[derive(Debug, Clone, Default)]
pub struct BindResult {
    /// Map from expression ID to inferred type.
    pub type_map: HashMap<i64, ExprType>,
    /// Errors encountered during binding.
    pub errors: Vec<BindError>,
}

impl BindResult {
    /// Whether binding succeeded (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The inferred type for an expression ID.
    pub fn get_type(&self, expr_id: i64) -> Option<&ExprType> {
        self.type_map.get(&expr_id)
    }
}

/// Bind an expression against variables, functions, and a field-type
/// provider.
pub fn bind(
    expr: &SpannedExpr,
    variables: &HashMap<String, ExprType>,
    functions: &HashMap<String, FunctionDecl>,
    provider: &dyn FieldTypeProvider,
) -> BindResult {
    let mut binder = Binder {
        variables,
        functions,
        provider,
        result: BindResult::default(),
    };
    binder.bind_expr(expr);
    binder.result
}

/// Bind a constraint predicate: like [`bind`], but additionally requires
/// the expression to produce a bool.
pub fn bind_predicate(
    expr: &SpannedExpr,
    variables: &HashMap<String, ExprType>,
    functions: &HashMap<String, FunctionDecl>,
    provider: &dyn FieldTypeProvider,
) -> BindResult {
    let mut binder = Binder {
        variables,
        functions,
        provider,
        result: BindResult::default(),
    };
    let result_type = binder.bind_expr(expr);

    if !result_type.maybe_bool() {
        binder.result.errors.push(BindError {
            message: format!(
                "constraint must evaluate to bool, got {}",
                result_type.display_name()
            ),
            span: expr.span.clone(),
            kind: BindErrorKind::NotAPredicate,
        });
    }

    binder.result
}

struct Binder<'a> {
    variables: &'a HashMap<String, ExprType>,
    functions: &'a HashMap<String, FunctionDecl>,
    provider: &'a dyn FieldTypeProvider,
    result: BindResult,
}

impl Binder<'_> {
    fn error(&mut self, kind: BindErrorKind, span: &Span, message: String) {
        self.result.errors.push(BindError {
            message,
            span: span.clone(),
            kind,
        });
    }

    fn record(&mut self, expr: &SpannedExpr, ty: ExprType) -> ExprType {
        self.result.type_map.insert(expr.id, ty.clone());
        ty
    }

    fn bind_expr(&mut self, expr: &SpannedExpr) -> ExprType {
        let ty = match &expr.node {
            Expr::Null => ExprType::Null,
            Expr::Bool(_) => ExprType::Bool,
            Expr::Int(_) => ExprType::Int,
            Expr::UInt(_) => ExprType::UInt,
            Expr::Double(_) => ExprType::Double,
            Expr::String(_) => ExprType::String,
            Expr::Bytes(_) => ExprType::Bytes,

            Expr::Ident(name) => self.bind_ident(name, &expr.span),
            Expr::List(elements) => self.bind_list(elements),
            Expr::Map(entries) => self.bind_map(entries, &expr.span),
            Expr::Unary { op, expr: operand } => self.bind_unary(*op, operand, &expr.span),
            Expr::Binary { op, left, right } => self.bind_binary(*op, left, right, &expr.span),
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.bind_ternary(cond, then_expr, else_expr),
            Expr::Member { expr: base, field } => self.bind_member(base, field, &expr.span),
            Expr::Index { expr: base, index } => self.bind_index(base, index, &expr.span),
            Expr::Call {
                target,
                function,
                args,
            } => self.bind_call(target.as_deref(), function, args, &expr.span),
            Expr::Has { expr: base, field } => self.bind_has(base, field, &expr.span),
        };

        self.record(expr, ty)
    }

    fn bind_ident(&mut self, name: &str, span: &Span) -> ExprType {
        match self.variables.get(name) {
            Some(ty) => ty.clone(),
            None => {
                self.error(
                    BindErrorKind::UndeclaredReference,
                    span,
                    format!("undeclared reference: {}", name),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_list(&mut self, elements: &[SpannedExpr]) -> ExprType {
        let mut elem_type: Option<ExprType> = None;
        for elem in elements {
            let ty = self.bind_expr(elem);
            elem_type = Some(match elem_type {
                Some(prev) => prev.lub(&ty),
                None => ty,
            });
        }
        ExprType::list(elem_type.unwrap_or(ExprType::Dyn))
    }

    fn bind_map(&mut self, entries: &[(SpannedExpr, SpannedExpr)], span: &Span) -> ExprType {
        let mut key_type: Option<ExprType> = None;
        let mut value_type: Option<ExprType> = None;

        for (key, value) in entries {
            let kt = self.bind_expr(key);
            if !matches!(
                kt,
                ExprType::Bool | ExprType::Int | ExprType::UInt | ExprType::String | ExprType::Dyn
            ) {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!("{} is not a valid map key type", kt.display_name()),
                );
            }
            let vt = self.bind_expr(value);

            key_type = Some(match key_type {
                Some(prev) => prev.lub(&kt),
                None => kt,
            });
            value_type = Some(match value_type {
                Some(prev) => prev.lub(&vt),
                None => vt,
            });
        }

        ExprType::map(
            key_type.unwrap_or(ExprType::Dyn),
            value_type.unwrap_or(ExprType::Dyn),
        )
    }

    fn bind_unary(&mut self, op: UnaryOp, operand: &SpannedExpr, span: &Span) -> ExprType {
        let ty = self.bind_expr(operand);
        match op {
            UnaryOp::Neg => {
                if !(matches!(ty, ExprType::Int | ExprType::Double | ExprType::Dyn)) {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        span,
                        format!("cannot negate {}", ty.display_name()),
                    );
                    return ExprType::Dyn;
                }
                ty
            }
            UnaryOp::Not => {
                if !ty.maybe_bool() {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        span,
                        format!("'!' requires bool, got {}", ty.display_name()),
                    );
                }
                ExprType::Bool
            }
        }
    }

    fn bind_binary(
        &mut self,
        op: BinaryOp,
        left: &SpannedExpr,
        right: &SpannedExpr,
        span: &Span,
    ) -> ExprType {
        let lt = self.bind_expr(left);
        let rt = self.bind_expr(right);

        match op {
            BinaryOp::And | BinaryOp::Or => {
                if !lt.maybe_bool() {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        &left.span,
                        format!("logical operand must be bool, got {}", lt.display_name()),
                    );
                }
                if !rt.maybe_bool() {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        &right.span,
                        format!("logical operand must be bool, got {}", rt.display_name()),
                    );
                }
                ExprType::Bool
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if !lt.compatible_with(&rt) {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        span,
                        format!(
                            "cannot compare {} with {}",
                            lt.display_name(),
                            rt.display_name()
                        ),
                    );
                }
                ExprType::Bool
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if !is_orderable_pair(&lt, &rt) {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        span,
                        format!(
                            "cannot order {} against {}",
                            lt.display_name(),
                            rt.display_name()
                        ),
                    );
                }
                ExprType::Bool
            }
            BinaryOp::In => {
                match &rt {
                    ExprType::List(elem) => {
                        if !lt.compatible_with(elem) {
                            self.error(
                                BindErrorKind::TypeMismatch,
                                span,
                                format!(
                                    "{} cannot be a member of {}",
                                    lt.display_name(),
                                    rt.display_name()
                                ),
                            );
                        }
                    }
                    ExprType::Map(key, _) => {
                        if !lt.compatible_with(key) {
                            self.error(
                                BindErrorKind::TypeMismatch,
                                span,
                                format!(
                                    "{} cannot be a key of {}",
                                    lt.display_name(),
                                    rt.display_name()
                                ),
                            );
                        }
                    }
                    ExprType::Dyn => {}
                    other => {
                        self.error(
                            BindErrorKind::TypeMismatch,
                            &right.span,
                            format!("'in' requires a list or map, got {}", other.display_name()),
                        );
                    }
                }
                ExprType::Bool
            }
            BinaryOp::Add => self.bind_add(&lt, &rt, span),
            BinaryOp::Sub => self.bind_sub(&lt, &rt, span),
            BinaryOp::Mul | BinaryOp::Div => self.bind_numeric(&lt, &rt, span),
            BinaryOp::Mod => {
                if matches!(
                    (&lt, &rt),
                    (ExprType::Int, ExprType::Int)
                        | (ExprType::UInt, ExprType::UInt)
                        | (ExprType::Dyn, _)
                        | (_, ExprType::Dyn)
                ) {
                    lt.lub(&rt)
                } else {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        span,
                        format!(
                            "no '%' overload for {} and {}",
                            lt.display_name(),
                            rt.display_name()
                        ),
                    );
                    ExprType::Dyn
                }
            }
        }
    }

    fn bind_add(&mut self, lt: &ExprType, rt: &ExprType, span: &Span) -> ExprType {
        match (lt, rt) {
            (ExprType::Dyn, other) | (other, ExprType::Dyn) => {
                // Resolves at runtime; assume the concrete side wins
                other.clone()
            }
            (ExprType::Int, ExprType::Int)
            | (ExprType::UInt, ExprType::UInt)
            | (ExprType::Double, ExprType::Double)
            | (ExprType::String, ExprType::String)
            | (ExprType::Bytes, ExprType::Bytes)
            | (ExprType::Duration, ExprType::Duration) => lt.clone(),
            (ExprType::List(_), ExprType::List(_)) => lt.lub(rt),
            (ExprType::Timestamp, ExprType::Duration) | (ExprType::Duration, ExprType::Timestamp) => {
                ExprType::Timestamp
            }
            _ => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!(
                        "no '+' overload for {} and {}",
                        lt.display_name(),
                        rt.display_name()
                    ),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_sub(&mut self, lt: &ExprType, rt: &ExprType, span: &Span) -> ExprType {
        match (lt, rt) {
            (ExprType::Dyn, _) | (_, ExprType::Dyn) => ExprType::Dyn,
            (ExprType::Int, ExprType::Int)
            | (ExprType::UInt, ExprType::UInt)
            | (ExprType::Double, ExprType::Double)
            | (ExprType::Duration, ExprType::Duration) => lt.clone(),
            (ExprType::Timestamp, ExprType::Timestamp) => ExprType::Duration,
            (ExprType::Timestamp, ExprType::Duration) => ExprType::Timestamp,
            _ => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!(
                        "no '-' overload for {} and {}",
                        lt.display_name(),
                        rt.display_name()
                    ),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_numeric(&mut self, lt: &ExprType, rt: &ExprType, span: &Span) -> ExprType {
        match (lt, rt) {
            (ExprType::Dyn, _) | (_, ExprType::Dyn) => ExprType::Dyn,
            (ExprType::Int, ExprType::Int)
            | (ExprType::UInt, ExprType::UInt)
            | (ExprType::Double, ExprType::Double) => lt.clone(),
            _ => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!(
                        "no arithmetic overload for {} and {}",
                        lt.display_name(),
                        rt.display_name()
                    ),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_ternary(
        &mut self,
        cond: &SpannedExpr,
        then_expr: &SpannedExpr,
        else_expr: &SpannedExpr,
    ) -> ExprType {
        let ct = self.bind_expr(cond);
        if !ct.maybe_bool() {
            self.error(
                BindErrorKind::TypeMismatch,
                &cond.span,
                format!("ternary condition must be bool, got {}", ct.display_name()),
            );
        }

        let tt = self.bind_expr(then_expr);
        let et = self.bind_expr(else_expr);
        tt.lub(&et)
    }

    fn bind_member(&mut self, base: &SpannedExpr, field: &str, span: &Span) -> ExprType {
        let base_type = self.bind_expr(base);

        match &base_type {
            ExprType::Message(name) => match self.provider.field_type(name, field) {
                Some(ty) => ty,
                None => {
                    self.error(
                        BindErrorKind::UnknownField,
                        span,
                        format!("message {} has no field '{}'", name, field),
                    );
                    ExprType::Dyn
                }
            },
            ExprType::Map(_, value) => value.as_ref().clone(),
            ExprType::Dyn => ExprType::Dyn,
            other => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!("{} has no fields", other.display_name()),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_index(&mut self, base: &SpannedExpr, index: &SpannedExpr, span: &Span) -> ExprType {
        let base_type = self.bind_expr(base);
        let index_type = self.bind_expr(index);

        match &base_type {
            ExprType::List(elem) => {
                if !matches!(index_type, ExprType::Int | ExprType::UInt | ExprType::Dyn) {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        &index.span,
                        format!("list index must be int, got {}", index_type.display_name()),
                    );
                }
                elem.as_ref().clone()
            }
            ExprType::Map(key, value) => {
                if !index_type.compatible_with(key) {
                    self.error(
                        BindErrorKind::TypeMismatch,
                        &index.span,
                        format!(
                            "map key must be {}, got {}",
                            key.display_name(),
                            index_type.display_name()
                        ),
                    );
                }
                value.as_ref().clone()
            }
            ExprType::Dyn => ExprType::Dyn,
            other => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!("{} cannot be indexed", other.display_name()),
                );
                ExprType::Dyn
            }
        }
    }

    fn bind_call(
        &mut self,
        target: Option<&SpannedExpr>,
        function: &str,
        args: &[SpannedExpr],
        span: &Span,
    ) -> ExprType {
        let receiver_type = target.map(|t| self.bind_expr(t));
        let arg_types: Vec<ExprType> = args.iter().map(|a| self.bind_expr(a)).collect();

        let decl = match self.functions.get(function) {
            Some(decl) => decl,
            None => {
                self.error(
                    BindErrorKind::UnknownFunction,
                    span,
                    format!("unknown function: {}", function),
                );
                return ExprType::Dyn;
            }
        };

        let is_member = receiver_type.is_some();
        let candidates = decl.matching(args.len(), is_member);
        if candidates.is_empty() {
            self.error(
                BindErrorKind::NoMatchingOverload,
                span,
                format!(
                    "no overload of {} takes {} argument(s){}",
                    function,
                    args.len(),
                    if is_member { " as a method" } else { "" }
                ),
            );
            return ExprType::Dyn;
        }

        // Filter candidates by loose argument compatibility
        let viable: Vec<&OverloadDecl> = candidates
            .iter()
            .copied()
            .filter(|o| overload_accepts(o, receiver_type.as_ref(), &arg_types))
            .collect();

        match viable.as_slice() {
            [] => {
                self.error(
                    BindErrorKind::NoMatchingOverload,
                    span,
                    format!("no overload of {} matches the argument types", function),
                );
                ExprType::Dyn
            }
            [single] => single.result.clone(),
            many => many
                .iter()
                .map(|o| o.result.clone())
                .reduce(|a, b| a.lub(&b))
                .unwrap_or(ExprType::Dyn),
        }
    }

    fn bind_has(&mut self, base: &SpannedExpr, field: &str, span: &Span) -> ExprType {
        let base_type = self.bind_expr(base);

        match &base_type {
            ExprType::Message(name) => {
                if self.provider.field_type(name, field).is_none() {
                    self.error(
                        BindErrorKind::UnknownField,
                        span,
                        format!("message {} has no field '{}'", name, field),
                    );
                }
            }
            ExprType::Map(_, _) | ExprType::Dyn => {}
            other => {
                self.error(
                    BindErrorKind::TypeMismatch,
                    span,
                    format!("has() requires a message or map, got {}", other.display_name()),
                );
            }
        }

        ExprType::Bool
    }
}

fn is_orderable_pair(lt: &ExprType, rt: &ExprType) -> bool {
    if matches!(lt, ExprType::Dyn) || matches!(rt, ExprType::Dyn) {
        return true;
    }
    if lt.is_numeric() && rt.is_numeric() {
        return true;
    }
    lt == rt
        && matches!(
            lt,
            ExprType::Bool
                | ExprType::String
                | ExprType::Bytes
                | ExprType::Timestamp
                | ExprType::Duration
        )
}

fn overload_accepts(
    overload: &OverloadDecl,
    receiver: Option<&ExprType>,
    args: &[ExprType],
) -> bool {
    if overload.is_member {
        let receiver_type = match receiver {
            Some(ty) => ty,
            None => return false,
        };
        let declared = match overload.params.first() {
            Some(ty) => ty,
            None => return false,
        };
        if !receiver_type.compatible_with(declared) {
            return false;
        }
    }

    overload
        .arg_types()
        .iter()
        .zip(args)
        .all(|(param, arg)| arg.compatible_with(param))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::stdlib::STANDARD_DECLARATIONS;

    struct OrderProvider;

    impl FieldTypeProvider for OrderProvider {
        fn field_type(&self, message: &str, field: &str) -> Option<ExprType> {
            match (message, field) {
                ("acme.Order", "total") => Some(ExprType::Int),
                ("acme.Order", "note") => Some(ExprType::String),
                ("acme.Order", "start") | ("acme.Order", "end") => Some(ExprType::Timestamp),
                ("acme.Order", "customer") => Some(ExprType::message("acme.Customer")),
                ("acme.Customer", "name") => Some(ExprType::String),
                _ => None,
            }
        }
    }

    fn bind_this(source: &str, this: ExprType) -> BindResult {
        let expr = parse(source).unwrap();
        let mut vars = HashMap::new();
        vars.insert("this".to_string(), this);
        vars.insert("now".to_string(), ExprType::Timestamp);
        bind_predicate(&expr, &vars, &STANDARD_DECLARATIONS, &OrderProvider)
    }

    #[test]
    fn bind_simple_predicate() {
        let result = bind_this("this > 0", ExprType::Int);
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_undeclared_reference() {
        let result = bind_this("that > 0", ExprType::Int);
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::UndeclaredReference);
    }

    #[test]
    fn bind_message_field_access() {
        let result = bind_this("this.total > 100", ExprType::message("acme.Order"));
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_nested_field_access() {
        let result = bind_this(
            "this.customer.name != ''",
            ExprType::message("acme.Order"),
        );
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_unknown_field() {
        let result = bind_this("this.nonexistent > 0", ExprType::message("acme.Order"));
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::UnknownField);
    }

    #[test]
    fn bind_has_guard() {
        let result = bind_this(
            "has(this.end) ? this.end > this.start : true",
            ExprType::message("acme.Order"),
        );
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_has_unknown_field() {
        let result = bind_this("has(this.nope)", ExprType::message("acme.Order"));
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::UnknownField);
    }

    #[test]
    fn bind_unknown_function() {
        let result = bind_this("frobnicate(this)", ExprType::Int);
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::UnknownFunction);
    }

    #[test]
    fn bind_wrong_arity() {
        let result = bind_this("this.contains('a', 'b')", ExprType::String);
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::NoMatchingOverload);
    }

    #[test]
    fn bind_wrong_argument_type() {
        let result = bind_this("this.contains(42)", ExprType::String);
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::NoMatchingOverload);
    }

    #[test]
    fn bind_rejects_non_bool_result() {
        let result = bind_this("this + 1", ExprType::Int);
        assert!(!result.is_ok());
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == BindErrorKind::NotAPredicate));
    }

    #[test]
    fn bind_type_mismatch_comparison() {
        let result = bind_this("this > 'abc'", ExprType::Int);
        assert!(!result.is_ok());
        assert_eq!(result.errors[0].kind, BindErrorKind::TypeMismatch);
    }

    #[test]
    fn bind_stdlib_call() {
        let result = bind_this("size(this) <= 80", ExprType::String);
        assert!(result.is_ok(), "{:?}", result.errors);

        let result = bind_this("this.size() <= 80", ExprType::String);
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_now_comparison() {
        let result = bind_this("this < now", ExprType::Timestamp);
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn bind_in_list() {
        let result = bind_this("this in ['a', 'b']", ExprType::String);
        assert!(result.is_ok(), "{:?}", result.errors);

        let result = bind_this("this in [1, 2]", ExprType::String);
        assert!(!result.is_ok());
    }

    #[test]
    fn bind_records_types() {
        let expr = parse("1 + 2").unwrap();
        let vars = HashMap::new();
        let result = bind(&expr, &vars, &STANDARD_DECLARATIONS, &EmptyTypeProvider);
        assert!(result.is_ok());
        assert_eq!(result.get_type(expr.id), Some(&ExprType::Int));
    }
}
