//! Expression evaluation for trellis.
//!
//! The orchestrator only needs two operations from an expression language,
//! captured by the [`Evaluator`] trait: evaluate a query against a JSON value
//! and iterate the elements of an array-valued query. [`JqEvaluator`] provides
//! them with the jq language.
//!
//! [`Template`] finds the `${ <expr> }` spans embedded in call definition
//! strings and renders them through an evaluator.

mod error;
mod evaluator;
mod jq;
mod template;

pub use error::EvalError;
pub use evaluator::{Evaluator, json_kind};
pub use jq::JqEvaluator;
pub use template::{Part, Template, rebase_prefix};
