use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("duplicate call name: {name}")]
  DuplicateName { name: String },

  /// A call name or error key collides with a reserved dictionary key.
  #[error("call '{name}' uses reserved key '{key}'")]
  ReservedName { name: String, key: String },

  #[error("call '{name}' depends on unknown call '{dependency}'")]
  UnknownDependency { name: String, dependency: String },

  #[error("cyclic dependency between calls: {}", remaining.join(", "))]
  CycleDetected { remaining: Vec<String> },
}
