//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Transport;
use crate::cache::ClientCache;
use crate::request::{RequestSpec, split_header};
use crate::status::Status;

/// Executes requests over HTTP.
///
/// Endpoint credentials are applied unless the request already carries an
/// `Authorization` header: a bearer token when the endpoint has one, else basic
/// auth.
pub struct HttpTransport {
  clients: ClientCache,
  timeout: Option<Duration>,
}

impl HttpTransport {
  pub fn new() -> Self {
    Self {
      clients: ClientCache::default(),
      timeout: None,
    }
  }

  /// Limit the total duration of every request.
  pub fn with_timeout(timeout: Duration) -> Self {
    Self {
      clients: ClientCache::new(Some(timeout)),
      timeout: Some(timeout),
    }
  }

  fn build_request(&self, request: &RequestSpec) -> Result<reqwest::RequestBuilder, Status> {
    let method = parse_method(&request.verb)?;
    let url = request.url()?;
    let client = self.clients.get_or_build(&request.endpoint)?;

    let mut builder = client.request(method, url);

    for line in &request.headers {
      let (name, value) = parse_header(line)?;
      builder = builder.header(name, value);
    }

    if !request.has_header(AUTHORIZATION.as_str()) {
      let endpoint = &request.endpoint;
      if let Some(token) = &endpoint.token {
        builder = builder.bearer_auth(token);
      } else if let (Some(username), Some(password)) = (&endpoint.username, &endpoint.password) {
        builder = builder.basic_auth(username, Some(password));
      }
    }

    if let Some(payload) = &request.payload {
      if !request.has_header(CONTENT_TYPE.as_str()) {
        builder = builder.header(CONTENT_TYPE, "application/json");
      }
      builder = builder.body(payload.clone());
    }

    if let Some(timeout) = self.timeout {
      builder = builder.timeout(timeout);
    }

    Ok(builder)
  }
}

impl Default for HttpTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn call(
    &self,
    request: &RequestSpec,
    cancel: &CancellationToken,
  ) -> Result<serde_json::Value, Status> {
    if cancel.is_cancelled() {
      return Err(Status::cancelled());
    }

    let builder = self.build_request(request)?;
    let endpoint_debug = request.endpoint.debug;

    if endpoint_debug {
      info!(
        verb = %request.verb,
        server_url = %request.endpoint.server_url,
        path = %request.path,
        headers = ?request.headers,
        payload = ?request.payload,
        bearer = request.endpoint.has_token(),
        basic = request.endpoint.has_basic_auth(),
        "http_request"
      );
    }

    let response = tokio::select! {
      result = builder.send() => result.map_err(transport_error)?,
      _ = cancel.cancelled() => return Err(Status::cancelled()),
    };

    let code = response.status();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_string();

    let body = tokio::select! {
      result = response.bytes() => result.map_err(transport_error)?,
      _ = cancel.cancelled() => return Err(Status::cancelled()),
    };

    if endpoint_debug {
      info!(
        code = code.as_u16(),
        content_type = %content_type,
        body = %String::from_utf8_lossy(&body),
        "http_response"
      );
    } else {
      debug!(code = code.as_u16(), content_type = %content_type, "http_response");
    }

    if !code.is_success() {
      return Err(Status::from_response(code.as_u16(), &body));
    }

    if !is_json_media_type(&content_type) {
      return Err(Status::not_acceptable(&content_type));
    }

    serde_json::from_slice(&body)
      .map_err(|e| Status::internal(format!("invalid JSON response body: {}", e)))
  }
}

fn transport_error(e: reqwest::Error) -> Status {
  if e.is_timeout() {
    Status::timeout(e.to_string())
  } else {
    Status::unavailable(e.to_string())
  }
}

/// Split a header line and check it is valid on the wire.
fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), Status> {
  let (name, value) = split_header(line)?;
  let name = HeaderName::from_bytes(name.as_bytes())
    .map_err(|e| Status::bad_request(format!("invalid header name '{}': {}", name, e)))?;
  let value = HeaderValue::from_str(value)
    .map_err(|e| Status::bad_request(format!("invalid value for header '{}': {}", name, e)))?;
  Ok((name, value))
}

/// `application/json` or any `+json` structured syntax type, parameters ignored.
fn is_json_media_type(content_type: &str) -> bool {
  let essence = content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase();
  essence == "application/json" || (essence.contains('/') && essence.ends_with("+json"))
}

fn parse_method(verb: &str) -> Result<Method, Status> {
  match verb.to_uppercase().as_str() {
    "GET" => Ok(Method::GET),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "DELETE" => Ok(Method::DELETE),
    "PATCH" => Ok(Method::PATCH),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    _ => Err(Status::method_not_allowed(verb)),
  }
}
