//! HTTP client caching.
//!
//! Clients are built once per distinct TLS/proxy configuration and reused
//! across calls and resolutions. Credentials are applied per request, so
//! endpoints that differ only in their credentials share a client.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;
use trellis_endpoint::Endpoint;

use crate::status::Status;

/// Cache key for built clients.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ClientKey {
  pub certificate_authority_data: Option<String>,
  pub proxy_url: Option<String>,
  pub insecure: bool,
}

impl ClientKey {
  pub fn for_endpoint(endpoint: &Endpoint) -> Self {
    Self {
      certificate_authority_data: endpoint.certificate_authority_data.clone(),
      proxy_url: endpoint.proxy_url.clone(),
      insecure: endpoint.insecure,
    }
  }
}

/// Caches HTTP clients to avoid rebuilding connection pools.
pub struct ClientCache {
  connect_timeout: Option<Duration>,
  cache: RwLock<HashMap<ClientKey, Client>>,
}

impl ClientCache {
  pub fn new(connect_timeout: Option<Duration>) -> Self {
    Self {
      connect_timeout,
      cache: RwLock::new(HashMap::new()),
    }
  }

  /// Get the client for an endpoint, or build and cache it.
  pub fn get_or_build(&self, endpoint: &Endpoint) -> Result<Client, Status> {
    let key = ClientKey::for_endpoint(endpoint);

    // Try read lock first
    {
      let cache = self
        .cache
        .read()
        .map_err(|e| Status::internal(format!("client cache lock poisoned: {}", e)))?;
      if let Some(client) = cache.get(&key) {
        return Ok(client.clone());
      }
    }

    let client = self.build(&key)?;

    {
      let mut cache = self
        .cache
        .write()
        .map_err(|e| Status::internal(format!("client cache lock poisoned: {}", e)))?;
      cache.insert(key, client.clone());
    }

    Ok(client)
  }

  fn build(&self, key: &ClientKey) -> Result<Client, Status> {
    let mut builder = Client::builder();

    if let Some(timeout) = self.connect_timeout {
      builder = builder.connect_timeout(timeout);
    }

    if let Some(pem) = &key.certificate_authority_data {
      let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes())
        .map_err(|e| Status::internal(format!("invalid certificate authority data: {}", e)))?;
      for cert in certs {
        builder = builder.add_root_certificate(cert);
      }
    }

    if key.insecure {
      builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(proxy_url) = &key.proxy_url {
      let proxy = reqwest::Proxy::all(proxy_url)
        .map_err(|e| Status::internal(format!("invalid proxy url '{}': {}", proxy_url, e)))?;
      builder = builder.proxy(proxy);
    }

    builder
      .build()
      .map_err(|e| Status::internal(format!("failed to build HTTP client: {}", e)))
  }

  /// Number of cached clients.
  pub fn len(&self) -> usize {
    self.cache.read().map(|c| c.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for ClientCache {
  fn default() -> Self {
    Self::new(None)
  }
}
