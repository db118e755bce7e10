use thiserror::Error;

/// Errors that can occur while resolving an endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
  /// No endpoint stored under the reference.
  #[error("endpoint not found: {reference}")]
  NotFound { reference: String },

  /// No reference given and no caller identity to derive one from.
  #[error("no endpoint reference and no caller identity to derive one")]
  MissingIdentity,

  /// A required key is absent from the stored endpoint.
  #[error("endpoint '{reference}' is missing '{field}'")]
  MissingField { reference: String, field: String },

  /// A stored value could not be decoded.
  #[error("endpoint '{reference}' has an invalid '{field}': {message}")]
  InvalidField {
    reference: String,
    field: String,
    message: String,
  },

  /// IO error reading the secret store.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Stored secret is not valid JSON.
  #[error("invalid secret document: {0}")]
  Json(#[from] serde_json::Error),
}
