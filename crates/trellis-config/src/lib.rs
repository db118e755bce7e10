//! Trellis Config
//!
//! This crate contains the serializable call definition types for trellis.
//! These types mirror the documents stored by the cluster (one named call per
//! entry, optionally depending on another call) before they are validated and
//! ordered by `trellis-graph`.
//!
//! Specifications can be loaded from:
//! - JSON files (via CLI with `trellis resolve calls.json`)
//! - Stored resources (as JSON blobs)
//!
//! Field names are part of the stored format and must stay stable.

mod call;
mod document;
mod endpoint;

pub use call::{CallDef, DEFAULT_ERROR_KEY, DEFAULT_VERB, DependsOn, PAGINATION_KEY};
pub use document::{CallSetDef, DocumentError};
pub use endpoint::EndpointRef;
