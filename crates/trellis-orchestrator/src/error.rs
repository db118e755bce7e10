//! Error types for orchestration.

use thiserror::Error;
use trellis_graph::GraphError;

/// Errors that stop a resolution before any call is made.
///
/// Everything that goes wrong once calls start running is recorded in the
/// result dictionary instead.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("invalid call set: {0}")]
  Graph(#[from] GraphError),
}

/// Errors raised while expanding a call into requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpandError {
  /// An expression in one of the call's templated fields failed.
  #[error("failed to render {field} of call '{call}': {message}")]
  Template {
    call: String,
    field: String,
    message: String,
  },
}
