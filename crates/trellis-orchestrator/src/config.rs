use serde::{Deserialize, Serialize};

/// Namespace caller-derived endpoints are looked up in by default.
pub const DEFAULT_AUTHN_NAMESPACE: &str = "trellis-system";

/// Configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
  /// Namespace of per-user endpoints, unless a resolution overrides it.
  pub authn_namespace: String,

  /// Render failed template expressions as their error text instead of
  /// failing the call.
  #[serde(default)]
  pub lenient_templates: bool,

  #[serde(default)]
  pub identity_headers: IdentityHeaders,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      authn_namespace: DEFAULT_AUTHN_NAMESPACE.to_string(),
      lenient_templates: false,
      identity_headers: IdentityHeaders::default(),
    }
  }
}

/// Header names used to forward the caller's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHeaders {
  pub user: String,
  pub groups: String,
}

impl Default for IdentityHeaders {
  fn default() -> Self {
    Self {
      user: "X-Forwarded-User".to_string(),
      groups: "X-Forwarded-Groups".to_string(),
    }
  }
}
