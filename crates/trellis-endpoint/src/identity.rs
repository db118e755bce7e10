use serde::{Deserialize, Serialize};
use trellis_config::EndpointRef;

/// Maximum length of a DNS-1123 subdomain.
const DNS1123_MAX_LEN: usize = 253;

/// Authenticated subject of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserInfo {
  pub username: String,
  #[serde(default)]
  pub groups: Vec<String>,
}

impl UserInfo {
  pub fn new(username: impl Into<String>, groups: Vec<String>) -> Self {
    Self {
      username: username.into(),
      groups,
    }
  }
}

/// Reference to the per-user endpoint of `username` in `namespace`.
///
/// Example: `("Jane.Doe@example.com", "auth")` -> `auth/jane.doe-example.com-clientconfig`
pub fn client_config_ref(username: &str, namespace: &str) -> EndpointRef {
  EndpointRef::new(format!("{}-clientconfig", dns1123(username)), namespace)
}

/// Make a string usable as a DNS-1123 subdomain name.
///
/// Lower-cases, replaces characters outside `[a-z0-9.-]` with `-`, trims
/// leading and trailing non-alphanumerics and truncates to 253 characters.
pub fn dns1123(value: &str) -> String {
  let mapped: String = value
    .to_lowercase()
    .chars()
    .map(|c| match c {
      'a'..='z' | '0'..='9' | '.' | '-' => c,
      _ => '-',
    })
    .collect();

  let trimmed = mapped.trim_matches(|c: char| !c.is_ascii_alphanumeric());
  let mut name: String = trimmed.chars().take(DNS1123_MAX_LEN).collect();

  // Truncation may expose a trailing separator.
  while name.ends_with(|c: char| !c.is_ascii_alphanumeric()) {
    name.pop();
  }

  name
}
