use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tokio::fs;

use crate::error::EndpointError;
use crate::store::{SecretData, SecretStore};

/// Filesystem-based secret store.
///
/// Secrets are stored one JSON document per file:
/// ```text
/// {root}/
/// └── demo-system/
///     └── cluster-endpoint.json
/// ```
///
/// Documents follow the Kubernetes secret shape. `data` values are base64
/// encoded, `stringData` values are plain and win over `data`:
/// ```json
/// { "data": { "token": "YWJj" }, "stringData": { "server-url": "https://..." } }
/// ```
pub struct FsSecretStore {
  root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretDocument {
  #[serde(default)]
  data: HashMap<String, String>,
  #[serde(default)]
  string_data: HashMap<String, String>,
}

impl FsSecretStore {
  /// Create a new filesystem store at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn secret_path(&self, namespace: &str, name: &str) -> PathBuf {
    self.root.join(namespace).join(format!("{}.json", name))
  }

  fn decode(namespace: &str, name: &str, doc: SecretDocument) -> Result<SecretData, EndpointError> {
    let mut decoded = SecretData::new();

    for (key, value) in doc.data {
      let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| EndpointError::InvalidField {
          reference: format!("{}/{}", namespace, name),
          field: key.clone(),
          message: e.to_string(),
        })?;
      let text = String::from_utf8(bytes).map_err(|e| EndpointError::InvalidField {
        reference: format!("{}/{}", namespace, name),
        field: key.clone(),
        message: e.to_string(),
      })?;
      decoded.insert(key, text);
    }

    decoded.extend(doc.string_data);
    Ok(decoded)
  }
}

#[async_trait]
impl SecretStore for FsSecretStore {
  async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, EndpointError> {
    // Names are single path segments.
    if [namespace, name]
      .iter()
      .any(|s| s.is_empty() || s.contains(['/', '\\']) || *s == "." || *s == "..")
    {
      return Ok(None);
    }

    let content = match fs::read_to_string(self.secret_path(namespace, name)).await {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };

    let doc: SecretDocument = serde_json::from_str(&content)?;
    Self::decode(namespace, name, doc).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn write_secret(root: &Path, namespace: &str, name: &str, content: &str) {
    let dir = root.join(namespace);
    fs::create_dir_all(&dir).await.unwrap();
    fs::write(dir.join(format!("{}.json", name)), content)
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_get_decodes_data_and_string_data() {
    let temp = tempfile::tempdir().unwrap();
    write_secret(
      temp.path(),
      "demo",
      "cluster",
      r#"{
        "data": { "token": "YWJj", "server-url": "aHR0cDovL2lnbm9yZWQ=" },
        "stringData": { "server-url": "https://cluster.local" }
      }"#,
    )
    .await;

    let store = FsSecretStore::new(temp.path());
    let data = store.get("demo", "cluster").await.unwrap().unwrap();

    assert_eq!(data["token"], "abc");
    assert_eq!(data["server-url"], "https://cluster.local");
  }

  #[tokio::test]
  async fn test_missing_secret() {
    let temp = tempfile::tempdir().unwrap();
    let store = FsSecretStore::new(temp.path());

    assert!(store.get("demo", "missing").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_path_segments_rejected() {
    let temp = tempfile::tempdir().unwrap();
    write_secret(temp.path(), "demo", "cluster", r#"{ "stringData": {} }"#).await;
    let store = FsSecretStore::new(temp.path().join("demo"));

    assert!(store.get("..", "demo/cluster").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_invalid_base64() {
    let temp = tempfile::tempdir().unwrap();
    write_secret(
      temp.path(),
      "demo",
      "cluster",
      r#"{ "data": { "token": "not base64!" } }"#,
    )
    .await;

    let store = FsSecretStore::new(temp.path());
    let result = store.get("demo", "cluster").await;

    assert!(matches!(result, Err(EndpointError::InvalidField { .. })));
  }

  #[tokio::test]
  async fn test_invalid_document() {
    let temp = tempfile::tempdir().unwrap();
    write_secret(temp.path(), "demo", "cluster", "not json").await;

    let store = FsSecretStore::new(temp.path());

    assert!(matches!(
      store.get("demo", "cluster").await,
      Err(EndpointError::Json(_))
    ));
  }
}
