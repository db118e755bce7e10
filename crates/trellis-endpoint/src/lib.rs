//! Endpoint resolution for trellis.
//!
//! An [`Endpoint`] bundles the server URL and credentials used to execute a
//! call. Endpoints are stored as secrets; [`SecretEndpointResolver`] looks them
//! up through a [`SecretStore`], falling back to a per-user secret derived from
//! the caller's identity when a call names no endpoint.

mod endpoint;
mod error;
mod fs_store;
mod identity;
mod resolver;
mod store;

pub use endpoint::Endpoint;
pub use error::EndpointError;
pub use fs_store::FsSecretStore;
pub use identity::{UserInfo, client_config_ref, dns1123};
pub use resolver::{EndpointResolver, SecretEndpointResolver};
pub use store::{SecretData, SecretStore};
pub use trellis_config::EndpointRef;
