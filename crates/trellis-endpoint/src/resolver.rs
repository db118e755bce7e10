use async_trait::async_trait;
use tracing::debug;
use trellis_config::EndpointRef;

use crate::endpoint::Endpoint;
use crate::error::EndpointError;
use crate::identity::{UserInfo, client_config_ref};
use crate::store::SecretStore;

/// Resolves the endpoint a call is executed against.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
  /// Resolve `reference`, or the caller's own endpoint when it is `None`.
  ///
  /// The caller's endpoint is looked up in `authn_namespace`.
  async fn resolve(
    &self,
    reference: Option<&EndpointRef>,
    caller: Option<&UserInfo>,
    authn_namespace: &str,
  ) -> Result<Endpoint, EndpointError>;
}

/// Endpoint resolver backed by a [`SecretStore`].
pub struct SecretEndpointResolver<S: SecretStore> {
  store: S,
}

impl<S: SecretStore> SecretEndpointResolver<S> {
  /// Create a new resolver reading from the given store.
  pub fn new(store: S) -> Self {
    Self { store }
  }
}

#[async_trait]
impl<S: SecretStore> EndpointResolver for SecretEndpointResolver<S> {
  async fn resolve(
    &self,
    reference: Option<&EndpointRef>,
    caller: Option<&UserInfo>,
    authn_namespace: &str,
  ) -> Result<Endpoint, EndpointError> {
    let reference = match (reference, caller) {
      (Some(reference), _) => reference.clone(),
      (None, Some(user)) if !user.username.is_empty() => {
        client_config_ref(&user.username, authn_namespace)
      }
      (None, _) => return Err(EndpointError::MissingIdentity),
    };

    debug!(endpoint = %reference, "resolving endpoint");

    let data = self
      .store
      .get(&reference.namespace, &reference.name)
      .await?
      .ok_or_else(|| EndpointError::NotFound {
        reference: reference.to_string(),
      })?;

    Endpoint::from_secret_data(&reference.to_string(), &data)
  }
}
