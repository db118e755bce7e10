use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointRef;

/// Verb used when a call does not declare one.
pub const DEFAULT_VERB: &str = "GET";

/// Dictionary key failures are recorded under when a call does not declare one.
pub const DEFAULT_ERROR_KEY: &str = "error";

/// Result dictionary key reserved for the pagination context. No call may use
/// it as its name or error key.
pub const PAGINATION_KEY: &str = "slice";

/// A named, templated description of one HTTP call.
///
/// Every string field except `name`, `filter` and the dependency iterator may
/// embed `${ <expr> }` spans that are evaluated against the results of the calls
/// resolved so far.
///
/// ```json
/// {
///   "name": "pods",
///   "path": "${ \"/api/v1/namespaces/\" + .ns.items[0].metadata.name + \"/pods\" }",
///   "dependsOn": { "name": "ns" },
///   "continueOnError": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDef {
  /// Unique within a call set. Used as the result key and as a dependency target.
  pub name: String,

  pub path: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub verb: Option<String>,

  /// `Name: value` header lines, each evaluated independently.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub headers: Vec<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payload: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub depends_on: Option<DependsOn>,

  /// Query applied to this call's own decoded response before it is stored.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub continue_on_error: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error_key: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endpoint_ref: Option<EndpointRef>,

  /// Forward the caller's bearer token even though `endpoint_ref` is set.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub export_jwt: Option<bool>,
}

/// Ordering and data-flow relationship to another call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsOn {
  /// Name of the call that must complete first.
  pub name: String,

  /// Query expected to yield an array; the call fans out once per element.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iterator: Option<String>,
}

impl CallDef {
  /// A `GET` call with no dependency, headers or payload.
  pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      verb: None,
      headers: Vec::new(),
      payload: None,
      depends_on: None,
      filter: None,
      continue_on_error: None,
      error_key: None,
      endpoint_ref: None,
      export_jwt: None,
    }
  }

  pub fn verb(&self) -> &str {
    match self.verb.as_deref() {
      Some(verb) if !verb.trim().is_empty() => verb,
      _ => DEFAULT_VERB,
    }
  }

  pub fn error_key(&self) -> &str {
    match self.error_key.as_deref() {
      Some(key) if !key.is_empty() => key,
      _ => DEFAULT_ERROR_KEY,
    }
  }

  pub fn continue_on_error(&self) -> bool {
    self.continue_on_error.unwrap_or(false)
  }

  pub fn export_jwt(&self) -> bool {
    self.export_jwt.unwrap_or(false)
  }

  /// Name of the call this one depends on, if any.
  pub fn dependency(&self) -> Option<&str> {
    self.depends_on.as_ref().map(|d| d.name.as_str())
  }

  /// Iterator query driving fan-out, if any.
  pub fn iterator(&self) -> Option<&str> {
    self
      .depends_on
      .as_ref()
      .and_then(|d| d.iterator.as_deref())
      .filter(|it| !it.trim().is_empty())
  }
}
