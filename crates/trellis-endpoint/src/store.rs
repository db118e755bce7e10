use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::EndpointError;

/// Decoded key/value content of a stored secret.
pub type SecretData = HashMap<String, String>;

/// Read access to stored secrets.
///
/// Implementations are shared by concurrent resolutions and must only be read.
#[async_trait]
pub trait SecretStore: Send + Sync {
  /// Get the decoded data of a secret, or `None` when it does not exist.
  async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, EndpointError>;
}
