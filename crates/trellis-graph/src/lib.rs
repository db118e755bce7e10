//! Trellis Graph
//!
//! This crate turns a set of call definitions into a validated, ordered
//! call graph ready for execution.
//!
//! Compared with the raw `trellis-config` types:
//! - Names are unique and every dependency points at a known call
//! - The graph is acyclic
//! - A schedule is fixed: every call appears after the call it depends on, and
//!   calls without an ordering constraint keep their input order

mod error;
mod graph;

pub use error::GraphError;
pub use graph::{CallGraph, sort};
