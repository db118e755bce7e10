use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;
use crate::store::SecretData;

const SERVER_URL: &str = "server-url";
const TOKEN: &str = "token";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const CERTIFICATE_AUTHORITY_DATA: &str = "certificate-authority-data";
const PROXY_URL: &str = "proxy-url";
const INSECURE: &str = "insecure";
const DEBUG: &str = "debug";

/// Connection and credential bundle used to execute a call.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
  pub server_url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  /// PEM encoded CA bundle trusted in addition to the system roots.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub certificate_authority_data: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub proxy_url: Option<String>,
  /// Skip TLS certificate verification.
  #[serde(default)]
  pub insecure: bool,
  /// Log request and response details.
  #[serde(default)]
  pub debug: bool,
}

impl Endpoint {
  pub fn new(server_url: impl Into<String>) -> Self {
    Self {
      server_url: server_url.into(),
      ..Default::default()
    }
  }

  /// Build an endpoint from stored secret data.
  ///
  /// `reference` only names the secret in error messages.
  pub fn from_secret_data(reference: &str, data: &SecretData) -> Result<Self, EndpointError> {
    let server_url = non_empty(data, SERVER_URL).ok_or_else(|| EndpointError::MissingField {
      reference: reference.to_string(),
      field: SERVER_URL.to_string(),
    })?;

    Ok(Self {
      server_url,
      token: non_empty(data, TOKEN),
      username: non_empty(data, USERNAME),
      password: non_empty(data, PASSWORD),
      certificate_authority_data: non_empty(data, CERTIFICATE_AUTHORITY_DATA),
      proxy_url: non_empty(data, PROXY_URL),
      insecure: flag(reference, data, INSECURE)?,
      debug: flag(reference, data, DEBUG)?,
    })
  }

  pub fn has_token(&self) -> bool {
    self.token.is_some()
  }

  pub fn has_basic_auth(&self) -> bool {
    self.username.is_some() && self.password.is_some()
  }
}

// Credentials stay out of logs.
impl fmt::Debug for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Endpoint")
      .field("server_url", &self.server_url)
      .field("token", &self.token.as_ref().map(|_| "<redacted>"))
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "<redacted>"))
      .field(
        "certificate_authority_data",
        &self.certificate_authority_data.is_some(),
      )
      .field("proxy_url", &self.proxy_url)
      .field("insecure", &self.insecure)
      .field("debug", &self.debug)
      .finish()
  }
}

fn non_empty(data: &SecretData, key: &str) -> Option<String> {
  data
    .get(key)
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(|v| v.to_string())
}

fn flag(reference: &str, data: &SecretData, key: &str) -> Result<bool, EndpointError> {
  match non_empty(data, key) {
    None => Ok(false),
    Some(value) => match value.to_lowercase().as_str() {
      "true" => Ok(true),
      "false" => Ok(false),
      _ => Err(EndpointError::InvalidField {
        reference: reference.to_string(),
        field: key.to_string(),
        message: format!("expected boolean, got '{}'", value),
      }),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn data(pairs: &[(&str, &str)]) -> SecretData {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_from_secret_data() {
    let endpoint = Endpoint::from_secret_data(
      "demo/cluster",
      &data(&[
        ("server-url", "https://cluster.local:6443"),
        ("token", "abc"),
        ("insecure", "TRUE"),
        ("proxy-url", ""),
      ]),
    )
    .unwrap();

    assert_eq!(endpoint.server_url, "https://cluster.local:6443");
    assert_eq!(endpoint.token.as_deref(), Some("abc"));
    assert!(endpoint.insecure);
    assert!(!endpoint.debug);
    assert_eq!(endpoint.proxy_url, None);
    assert!(endpoint.has_token());
    assert!(!endpoint.has_basic_auth());
  }

  #[test]
  fn test_missing_server_url() {
    let result = Endpoint::from_secret_data("demo/cluster", &data(&[("token", "abc")]));
    assert!(matches!(
      result,
      Err(EndpointError::MissingField { ref field, .. }) if field == "server-url"
    ));
  }

  #[test]
  fn test_invalid_flag() {
    let result = Endpoint::from_secret_data(
      "demo/cluster",
      &data(&[("server-url", "http://x"), ("debug", "yes")]),
    );
    assert!(matches!(result, Err(EndpointError::InvalidField { .. })));
  }

  #[test]
  fn test_debug_redacts_credentials() {
    let mut endpoint = Endpoint::new("http://x");
    endpoint.token = Some("super-secret".to_string());
    endpoint.password = Some("hunter2".to_string());

    let printed = format!("{:?}", endpoint);

    assert!(!printed.contains("super-secret"));
    assert!(!printed.contains("hunter2"));
    assert!(printed.contains("http://x"));
  }
}
