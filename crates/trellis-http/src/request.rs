use trellis_endpoint::Endpoint;

use crate::status::Status;

/// A fully rendered call bound to its endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
  pub endpoint: Endpoint,
  pub verb: String,
  /// Path (and optional query) relative to the endpoint's server URL.
  pub path: String,
  /// `Name: value` header lines.
  pub headers: Vec<String>,
  pub payload: Option<String>,
}

impl RequestSpec {
  /// Absolute URL of the request.
  pub fn url(&self) -> Result<url::Url, Status> {
    let raw = format!(
      "{}/{}",
      self.endpoint.server_url.trim_end_matches('/'),
      self.path.trim_start_matches('/')
    );
    url::Url::parse(&raw).map_err(|e| Status::bad_request(format!("invalid URL '{}': {}", raw, e)))
  }

  /// Whether a header with the given name is set (case-insensitive).
  pub fn has_header(&self, name: &str) -> bool {
    self
      .headers
      .iter()
      .filter_map(|line| split_header(line).ok())
      .any(|(n, _)| n.eq_ignore_ascii_case(name))
  }
}

/// Split a `Name: value` header line.
pub fn split_header(line: &str) -> Result<(&str, &str), Status> {
  match line.split_once(':') {
    Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
    _ => Err(Status::bad_request(format!("invalid header '{}'", line))),
  }
}
