//! provalid-cel: restricted expression language for constraint validation.
//!
//! A side-effect-free boolean expression language in the CEL family,
//! evaluated over a bound `this` value (the field or message under
//! validation) and `now` (the evaluation timestamp).
//!
//! # Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use provalid_cel::bind::{bind_predicate, EmptyTypeProvider};
//! use provalid_cel::eval::MapActivation;
//! use provalid_cel::stdlib::{standard_registry, STANDARD_DECLARATIONS};
//! use provalid_cel::{parse, ExprType, Program, Value};
//!
//! // Compile once, at schema load
//! let expr = parse("size(this) <= 5").unwrap();
//! let mut vars = HashMap::new();
//! vars.insert("this".to_string(), ExprType::String);
//! let bound = bind_predicate(&expr, &vars, &STANDARD_DECLARATIONS, &EmptyTypeProvider);
//! assert!(bound.is_ok());
//!
//! // Evaluate per instance
//! let program = Program::new(Arc::new(expr), Arc::new(standard_registry()));
//! let activation = MapActivation::new().with_binding("this", "short");
//! assert_eq!(program.eval(&activation), Value::Bool(true));
//! ```
//!
//! # Architecture
//!
//! - `lexer` / `parser`: source text to AST
//! - `bind`: compile-time binding and loose typechecking; schema errors
//!   are caught here, never at evaluation time
//! - `eval`: values, activations, and the tree-walking evaluator
//! - `stdlib`: standard function declarations and implementations
//! - `ext`: format extension predicates (`isEmail`, `isIp`, `unique`, ...)

pub mod ast;
pub mod bind;
pub mod eval;
pub mod ext;
pub mod lexer;
pub mod parser;
mod program;
pub mod stdlib;
pub mod types;

pub use ast::{BinaryOp, Expr, Span, Spanned, SpannedExpr, UnaryOp};
pub use bind::{bind, bind_predicate, BindError, BindErrorKind, BindResult, FieldTypeProvider};
pub use eval::{
    Activation, Duration, EvalError, EvalErrorKind, Evaluator, FunctionRegistry, MapActivation,
    MapKey, MessageValue, Timestamp, Value, ValueMap,
};
pub use parser::{parse, ParseError};
pub use program::Program;
pub use types::{ExprType, FunctionDecl, OverloadDecl};
