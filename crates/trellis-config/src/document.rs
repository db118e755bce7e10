use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::call::CallDef;

/// Errors raised while reading a call-set document.
#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("invalid call set document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("call set document contains no calls")]
  Empty,
}

/// A set of calls resolved together.
///
/// Documents are either a bare array of calls or an object:
///
/// ```json
/// {
///   "name": "dashboard",
///   "api": [{ "name": "ns", "path": "/api/v1/namespaces" }],
///   "filter": "{ namespaces: [.ns.items[].metadata.name] }"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSetDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  pub api: Vec<CallDef>,

  /// Query applied to the whole result dictionary once every call has run.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
  Calls(Vec<CallDef>),
  Set(CallSetDef),
}

impl CallSetDef {
  /// Parse a call-set document from JSON text.
  pub fn from_json(content: &str) -> Result<Self, DocumentError> {
    let set = match serde_json::from_str::<RawDocument>(content)? {
      RawDocument::Calls(api) => CallSetDef {
        name: None,
        api,
        filter: None,
      },
      RawDocument::Set(set) => set,
    };

    if set.api.is_empty() {
      return Err(DocumentError::Empty);
    }

    Ok(set)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bare_array() {
    let set = CallSetDef::from_json(
      r#"[
        { "name": "ns", "path": "/api/v1/namespaces" },
        { "name": "pods", "path": "/api/v1/pods", "dependsOn": { "name": "ns" } }
      ]"#,
    )
    .unwrap();

    assert_eq!(set.name, None);
    assert_eq!(set.api.len(), 2);
    assert_eq!(set.api[1].dependency(), Some("ns"));
  }

  #[test]
  fn test_object_with_filter() {
    let set = CallSetDef::from_json(
      r#"{
        "name": "dashboard",
        "api": [{ "name": "ns", "path": "/api/v1/namespaces" }],
        "filter": ".ns"
      }"#,
    )
    .unwrap();

    assert_eq!(set.name.as_deref(), Some("dashboard"));
    assert_eq!(set.filter.as_deref(), Some(".ns"));
  }

  #[test]
  fn test_empty_document_rejected() {
    assert!(matches!(
      CallSetDef::from_json("[]"),
      Err(DocumentError::Empty)
    ));
  }

  #[test]
  fn test_missing_path_rejected() {
    assert!(matches!(
      CallSetDef::from_json(r#"[{ "name": "ns" }]"#),
      Err(DocumentError::Parse(_))
    ));
  }
}
