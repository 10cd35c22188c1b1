//! Expression evaluation engine.
//!
//! Runtime infrastructure for bound constraint expressions:
//!
//! - `Value` represents runtime values, including dynamic messages
//! - `Activation` provides variable bindings (`this`, `now`)
//! - `FunctionRegistry` holds the callable function implementations
//! - `Evaluator` performs tree-walking evaluation
//!
//! Evaluation is pure and total: errors propagate as values, never as
//! panics.

mod activation;
mod error;
mod evaluator;
mod functions;
pub mod time;
mod value;

pub use activation::{Activation, EmptyActivation, MapActivation};
pub use error::{EvalError, EvalErrorKind};
pub use evaluator::Evaluator;
pub use functions::{Function, FunctionImpl, FunctionRegistry, Overload};
pub use value::{Duration, MapKey, MessageValue, Timestamp, Value, ValueMap};
