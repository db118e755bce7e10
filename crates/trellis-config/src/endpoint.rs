use serde::{Deserialize, Serialize};

/// Reference to the stored connection and credentials of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRef {
  /// Name of the stored endpoint, e.g. "github-endpoint"
  pub name: String,

  /// Namespace the endpoint lives in.
  pub namespace: String,
}

impl EndpointRef {
  pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      namespace: namespace.into(),
    }
  }
}

impl std::fmt::Display for EndpointRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}", self.namespace, self.name)
  }
}
