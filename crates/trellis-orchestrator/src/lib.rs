//! Call orchestration for trellis.
//!
//! This crate provides the [`Orchestrator`] which handles:
//! - Ordering a call set (via `trellis-graph`)
//! - Expanding call templates, including iterator fan-out
//! - Executing the resulting requests in order through a [`Transport`]
//! - Merging responses into the shared result [`Dictionary`]
//!
//! Collaborators are injected: an [`Evaluator`] for expressions, an
//! [`EndpointResolver`] for connection details and a [`Transport`] for the
//! requests themselves.
//!
//! [`Evaluator`]: trellis_expr::Evaluator
//! [`EndpointResolver`]: trellis_endpoint::EndpointResolver
//! [`Transport`]: trellis_http::Transport

mod config;
mod dictionary;
mod error;
mod expand;
mod headers;
mod orchestrator;

pub use config::{DEFAULT_AUTHN_NAMESPACE, IdentityHeaders, OrchestratorConfig};
pub use dictionary::{Dictionary, PAGINATION_KEY, Pagination};
pub use error::{ExpandError, ResolveError};
pub use expand::{ResolvedRequest, expand};
pub use headers::standard_headers;
pub use orchestrator::{Orchestrator, ResolveOptions};
