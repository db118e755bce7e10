//! HTTP transport for trellis.
//!
//! A [`RequestSpec`] is one fully rendered call bound to its [`Endpoint`]. A
//! [`Transport`] executes it and yields either the decoded JSON body or a
//! failure [`Status`].
//!
//! Success means a 2xx response with a JSON content type and a body that
//! decodes as JSON. Everything else, including network errors and
//! cancellation, is a `Status`.
//!
//! [`Endpoint`]: trellis_endpoint::Endpoint

mod cache;
mod client;
mod request;
mod status;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use cache::ClientCache;
pub use client::HttpTransport;
pub use request::{RequestSpec, split_header};
pub use status::Status;

/// Executes rendered requests.
#[async_trait]
pub trait Transport: Send + Sync {
  /// Execute `request` once. No retries.
  async fn call(
    &self,
    request: &RequestSpec,
    cancel: &CancellationToken,
  ) -> Result<serde_json::Value, Status>;
}
