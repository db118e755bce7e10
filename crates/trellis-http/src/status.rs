//! Failure status of a call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP-like failure recorded for a call.
///
/// Serialized into the result dictionary under the call's error key:
/// ```json
/// { "code": 404, "reason": "NotFound", "message": "namespaces \"x\" not found" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code} {reason}: {message}")]
pub struct Status {
  pub code: u16,
  pub reason: String,
  pub message: String,
}

impl Status {
  pub fn new(code: u16, message: impl Into<String>) -> Self {
    Self {
      code,
      reason: reason_for(code).to_string(),
      message: message.into(),
    }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(400, message)
  }

  pub fn method_not_allowed(verb: &str) -> Self {
    Self::new(405, format!("unsupported HTTP method: {}", verb))
  }

  pub fn not_acceptable(content_type: &str) -> Self {
    Self::new(
      406,
      format!(
        "only 'application/json' responses are supported, got '{}'",
        content_type
      ),
    )
  }

  pub fn cancelled() -> Self {
    Self::new(499, "request cancelled")
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::new(500, message)
  }

  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::new(503, message)
  }

  pub fn timeout(message: impl Into<String>) -> Self {
    Self::new(504, message)
  }

  /// Status for a non-2xx response.
  ///
  /// The message is the body's JSON `message` field when present, else the
  /// body text, else the reason.
  pub fn from_response(code: u16, body: &[u8]) -> Self {
    let message = serde_json::from_slice::<serde_json::Value>(body)
      .ok()
      .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
      .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    let mut status = Self::new(code, message);
    if status.message.is_empty() {
      status.message = status.reason.clone();
    }
    status
  }

  pub fn is_cancelled(&self) -> bool {
    self.code == 499
  }

  /// Dictionary representation of the status.
  pub fn to_value(&self) -> serde_json::Value {
    serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::String(self.message.clone()))
  }
}

fn reason_for(code: u16) -> &'static str {
  match code {
    400 => "BadRequest",
    401 => "Unauthorized",
    403 => "Forbidden",
    404 => "NotFound",
    405 => "MethodNotAllowed",
    406 => "NotAcceptable",
    409 => "Conflict",
    410 => "Gone",
    422 => "Invalid",
    429 => "TooManyRequests",
    499 => "ClientClosedRequest",
    500 => "InternalError",
    502 => "BadGateway",
    503 => "ServiceUnavailable",
    504 => "Timeout",
    _ => "Unknown",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_from_response_uses_json_message() {
    let status = Status::from_response(404, br#"{"kind":"Status","message":"namespaces \"x\" not found"}"#);

    assert_eq!(status.code, 404);
    assert_eq!(status.reason, "NotFound");
    assert_eq!(status.message, r#"namespaces "x" not found"#);
  }

  #[test]
  fn test_from_response_uses_text_body() {
    let status = Status::from_response(502, b"  upstream down\n");
    assert_eq!(status.message, "upstream down");
  }

  #[test]
  fn test_from_response_empty_body() {
    let status = Status::from_response(403, b"");
    assert_eq!(status.message, "Forbidden");
  }

  #[test]
  fn test_to_value() {
    let status = Status::cancelled();

    assert!(status.is_cancelled());
    assert_eq!(
      status.to_value(),
      json!({ "code": 499, "reason": "ClientClosedRequest", "message": "request cancelled" })
    );
  }

  #[test]
  fn test_display() {
    assert_eq!(
      Status::internal("boom").to_string(),
      "500 InternalError: boom"
    );
  }
}
