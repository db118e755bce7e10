use trellis_config::CallDef;
use trellis_endpoint::UserInfo;
use trellis_http::split_header;

use crate::config::IdentityHeaders;

const ACCEPT: &str = "Accept";
const AUTHORIZATION: &str = "Authorization";

/// Headers added to every request of `call` after its own header lines.
///
/// - `Accept: application/json` unless the call sets `Accept`
/// - the caller's name and groups under the identity header names
/// - `Authorization: Bearer <token>` when a caller token is present, the call
///   does not set `Authorization` and either names no endpoint or sets
///   `exportJwt`
pub fn standard_headers(
  call: &CallDef,
  own: &[String],
  caller: Option<&UserInfo>,
  access_token: Option<&str>,
  identity: &IdentityHeaders,
) -> Vec<String> {
  let mut headers = Vec::new();

  if !declares(own, ACCEPT) {
    headers.push(format!("{}: application/json", ACCEPT));
  }

  if let Some(user) = caller {
    if !user.username.is_empty() {
      headers.push(format!("{}: {}", identity.user, user.username));
    }
    if !user.groups.is_empty() {
      headers.push(format!("{}: {}", identity.groups, user.groups.join(",")));
    }
  }

  if let Some(token) = access_token.filter(|t| !t.is_empty())
    && (call.endpoint_ref.is_none() || call.export_jwt())
    && !declares(own, AUTHORIZATION)
  {
    headers.push(format!("{}: Bearer {}", AUTHORIZATION, token));
  }

  headers
}

fn declares(headers: &[String], name: &str) -> bool {
  headers
    .iter()
    .filter_map(|line| split_header(line).ok())
    .any(|(n, _)| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
  use super::*;
  use trellis_config::EndpointRef;

  fn user() -> UserInfo {
    UserInfo::new("jane", vec!["devs".to_string(), "ops".to_string()])
  }

  #[test]
  fn test_defaults_for_caller_endpoint() {
    let call = CallDef::new("a", "/a");

    let headers = standard_headers(
      &call,
      &[],
      Some(&user()),
      Some("tok"),
      &IdentityHeaders::default(),
    );

    assert_eq!(
      headers,
      vec![
        "Accept: application/json",
        "X-Forwarded-User: jane",
        "X-Forwarded-Groups: devs,ops",
        "Authorization: Bearer tok",
      ]
    );
  }

  #[test]
  fn test_token_not_forwarded_to_named_endpoint() {
    let mut call = CallDef::new("a", "/a");
    call.endpoint_ref = Some(EndpointRef::new("github", "demo"));

    let headers = standard_headers(&call, &[], None, Some("tok"), &IdentityHeaders::default());
    assert_eq!(headers, vec!["Accept: application/json"]);

    call.export_jwt = Some(true);
    let headers = standard_headers(&call, &[], None, Some("tok"), &IdentityHeaders::default());
    assert_eq!(headers, vec!["Accept: application/json", "Authorization: Bearer tok"]);
  }

  #[test]
  fn test_own_headers_win() {
    let call = CallDef::new("a", "/a");
    let own = vec![
      "accept: text/plain".to_string(),
      "Authorization: Basic abc".to_string(),
    ];

    let headers = standard_headers(&call, &own, None, Some("tok"), &IdentityHeaders::default());

    assert!(headers.is_empty());
  }

  #[test]
  fn test_custom_identity_header_names() {
    let call = CallDef::new("a", "/a");
    let identity = IdentityHeaders {
      user: "Impersonate-User".to_string(),
      groups: "Impersonate-Group".to_string(),
    };

    let headers = standard_headers(
      &call,
      &["Accept: application/json".to_string()],
      Some(&UserInfo::new("jane", Vec::new())),
      None,
      &identity,
    );

    assert_eq!(headers, vec!["Impersonate-User: jane"]);
  }
}
