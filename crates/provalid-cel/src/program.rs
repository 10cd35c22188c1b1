//! Compiled expression ready for evaluation.

use std::sync::Arc;

use crate::ast::SpannedExpr;
use crate::eval::{Activation, EmptyActivation, Evaluator, FunctionRegistry, Value};

/// A bound expression paired with its function registry.
///
/// Programs are built once at schema-compile time and evaluated many
/// times; they are immutable and cheap to clone.
#[derive(Clone)]
pub struct Program {
    expr: Arc<SpannedExpr>,
    functions: Arc<FunctionRegistry>,
}

impl Program {
    /// Create a new program from a bound expression and function registry.
    pub fn new(expr: Arc<SpannedExpr>, functions: Arc<FunctionRegistry>) -> Self {
        Self { expr, functions }
    }

    /// The expression tree.
    pub fn expr(&self) -> &SpannedExpr {
        &self.expr
    }

    /// The function registry.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Evaluate the program with the given variable bindings.
    pub fn eval(&self, activation: &dyn Activation) -> Value {
        Evaluator::new(activation, &self.functions).eval(&self.expr)
    }

    /// Evaluate the program with no variable bindings.
    pub fn eval_empty(&self) -> Value {
        self.eval(&EmptyActivation)
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("expr", &self.expr)
            .field("functions", &format!("{} functions", self.functions.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::MapActivation;
    use crate::parser::parse;

    fn program(source: &str) -> Program {
        let expr = parse(source).unwrap();
        Program::new(Arc::new(expr), Arc::new(FunctionRegistry::new()))
    }

    #[test]
    fn test_eval_literal() {
        assert_eq!(program("42").eval_empty(), Value::Int(42));
    }

    #[test]
    fn test_reuse_program() {
        let program = program("this * 2");

        let act1 = MapActivation::new().with_binding("this", 5i64);
        assert_eq!(program.eval(&act1), Value::Int(10));

        let act2 = MapActivation::new().with_binding("this", 21i64);
        assert_eq!(program.eval(&act2), Value::Int(42));
    }
}
