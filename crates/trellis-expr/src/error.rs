use thiserror::Error;

/// Errors raised while evaluating a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
  /// The query could not be parsed.
  #[error("failed to parse query '{query}': {message}")]
  Parse { query: String, message: String },

  /// The query refers to undefined filters or variables.
  #[error("failed to compile query '{query}': {message}")]
  Compile { query: String, message: String },

  /// The query failed against the given input.
  #[error("failed to evaluate query '{query}': {message}")]
  Runtime { query: String, message: String },

  /// The query result is not valid JSON.
  #[error("query '{query}' produced invalid JSON: {message}")]
  Output { query: String, message: String },

  /// An array was required.
  #[error("query '{query}' must yield an array, got {found}")]
  NotAnArray { query: String, found: String },
}
