//! The orchestrator: runs a call set in dependency order.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use trellis_config::CallDef;
use trellis_endpoint::{EndpointResolver, UserInfo};
use trellis_expr::Evaluator;
use trellis_graph::CallGraph;
use trellis_http::{RequestSpec, Status, Transport};

use crate::config::OrchestratorConfig;
use crate::dictionary::{Dictionary, PAGINATION_KEY, Pagination};
use crate::error::ResolveError;
use crate::expand::expand;
use crate::headers::standard_headers;

/// Options for a single resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
  /// Calls to resolve.
  pub items: Vec<CallDef>,

  /// Overrides the configured namespace of per-user endpoints.
  pub authn_namespace: Option<String>,

  /// Authenticated caller, forwarded in identity headers and used to find the
  /// caller's own endpoint.
  pub user: Option<UserInfo>,

  /// Caller's bearer token.
  pub access_token: Option<String>,

  /// Log every request at `info` instead of `debug`.
  pub verbose: bool,

  pub per_page: u64,
  pub page: u64,

  /// Query applied to the final dictionary.
  pub filter: Option<String>,
}

impl ResolveOptions {
  pub fn new(items: Vec<CallDef>) -> Self {
    Self {
      items,
      ..Default::default()
    }
  }
}

/// Whether resolution goes on after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
  Continue,
  Halt,
}

/// Per-resolution state shared by every call.
struct Resolution<'a> {
  id: String,
  options: &'a ResolveOptions,
  authn_namespace: &'a str,
  cancel: &'a CancellationToken,
}

/// Resolves call sets.
///
/// Calls run one request at a time in dependency order: every call sees the
/// results of all calls resolved before it, not just its dependency.
/// Concurrent resolutions share nothing but the injected collaborators.
pub struct Orchestrator {
  config: OrchestratorConfig,
  evaluator: Arc<dyn Evaluator>,
  resolver: Arc<dyn EndpointResolver>,
  transport: Arc<dyn Transport>,
}

impl Orchestrator {
  pub fn new(
    config: OrchestratorConfig,
    evaluator: Arc<dyn Evaluator>,
    resolver: Arc<dyn EndpointResolver>,
    transport: Arc<dyn Transport>,
  ) -> Self {
    Self {
      config,
      evaluator,
      resolver,
      transport,
    }
  }

  /// Resolve a call set into a result dictionary.
  ///
  /// Only an invalid call set is an error, reported before any request is
  /// made. Failures of individual calls are recorded under their error key;
  /// a failed call without `continueOnError`, or an endpoint that cannot be
  /// resolved, stops the resolution and returns what was gathered so far.
  #[instrument(
    name = "resolve",
    skip(self, options, cancel),
    fields(calls = options.items.len())
  )]
  pub async fn resolve(
    &self,
    options: ResolveOptions,
    cancel: CancellationToken,
  ) -> Result<Map<String, Value>, ResolveError> {
    let graph = CallGraph::build(options.items.clone())?;

    let resolution = Resolution {
      id: uuid::Uuid::new_v4().to_string(),
      options: &options,
      authn_namespace: options
        .authn_namespace
        .as_deref()
        .unwrap_or(&self.config.authn_namespace),
      cancel: &cancel,
    };

    info!(
      resolution_id = %resolution.id,
      order = ?graph.order(),
      "resolution_started"
    );

    let mut dict = Dictionary::new();
    let pagination = Pagination::new(options.per_page, options.page);
    if let Some(pagination) = &pagination {
      dict.insert(PAGINATION_KEY, pagination.to_value());
    }

    let mut halted = false;
    for call in graph.iter() {
      if self.run_call(call, &mut dict, &resolution).await == Flow::Halt {
        error!(
          resolution_id = %resolution.id,
          call = %call.name,
          "resolution_halted"
        );
        halted = true;
        break;
      }
    }

    if pagination.is_some() {
      dict.remove(PAGINATION_KEY);
    }
    let mut result = dict.into_map();

    if let Some(filter) = options.filter.as_deref().filter(|f| !f.trim().is_empty()) {
      result = self.filter_result(result, filter, &resolution);
    }

    if !halted {
      info!(
        resolution_id = %resolution.id,
        keys = result.len(),
        "resolution_completed"
      );
    }

    Ok(result)
  }

  /// Run every request of one call.
  async fn run_call(&self, call: &CallDef, dict: &mut Dictionary, resolution: &Resolution<'_>) -> Flow {
    let options = resolution.options;

    let endpoint = match self
      .resolver
      .resolve(
        call.endpoint_ref.as_ref(),
        options.user.as_ref(),
        resolution.authn_namespace,
      )
      .await
    {
      Ok(endpoint) => endpoint,
      Err(e) => {
        error!(
          resolution_id = %resolution.id,
          call = %call.name,
          error = %e,
          "endpoint resolution failed"
        );
        return Flow::Halt;
      }
    };

    let requests = match expand(
      call,
      dict.as_value(),
      self.evaluator.as_ref(),
      self.config.lenient_templates,
    ) {
      Ok(requests) => requests,
      Err(e) => return self.record_failure(call, dict, Status::bad_request(e.to_string()), resolution),
    };

    for request in requests {
      let mut headers = request.headers;
      let extra = standard_headers(
        call,
        &headers,
        options.user.as_ref(),
        options.access_token.as_deref(),
        &self.config.identity_headers,
      );
      headers.extend(extra);

      let spec = RequestSpec {
        endpoint: endpoint.clone(),
        verb: request.verb,
        path: request.path,
        headers,
        payload: request.payload,
      };

      if options.verbose {
        info!(
          resolution_id = %resolution.id,
          call = %call.name,
          verb = %spec.verb,
          path = %spec.path,
          headers = spec.headers.len(),
          payload = spec.payload.is_some(),
          "call_started"
        );
      } else {
        debug!(
          resolution_id = %resolution.id,
          call = %call.name,
          verb = %spec.verb,
          path = %spec.path,
          headers = spec.headers.len(),
          payload = spec.payload.is_some(),
          "call_started"
        );
      }

      match self.transport.call(&spec, resolution.cancel).await {
        Ok(decoded) => {
          dict.merge_filtered(&call.name, decoded, call.filter.as_deref(), self.evaluator.as_ref());
          info!(
            resolution_id = %resolution.id,
            call = %call.name,
            path = %spec.path,
            "call_completed"
          );
        }
        Err(status) => {
          if self.record_failure(call, dict, status, resolution) == Flow::Halt {
            return Flow::Halt;
          }
        }
      }
    }

    Flow::Continue
  }

  /// Store a call failure under its error key and apply its error policy.
  fn record_failure(
    &self,
    call: &CallDef,
    dict: &mut Dictionary,
    status: Status,
    resolution: &Resolution<'_>,
  ) -> Flow {
    let continue_on_error = call.continue_on_error();

    warn!(
      resolution_id = %resolution.id,
      call = %call.name,
      code = status.code,
      error = %status.message,
      continue_on_error,
      cancelled = status.is_cancelled(),
      "call_failed"
    );

    dict.insert(call.error_key(), status.to_value());

    if continue_on_error {
      Flow::Continue
    } else {
      Flow::Halt
    }
  }

  /// Apply the call set's filter to the final dictionary.
  ///
  /// The filter must produce an object; otherwise the dictionary is kept.
  fn filter_result(
    &self,
    result: Map<String, Value>,
    filter: &str,
    resolution: &Resolution<'_>,
  ) -> Map<String, Value> {
    let data = Value::Object(result);
    match self.evaluator.eval_value(filter, &data) {
      Ok(Value::Object(filtered)) => filtered,
      Ok(other) => {
        warn!(
          resolution_id = %resolution.id,
          kind = trellis_expr::json_kind(&other),
          "result filter did not produce an object, keeping unfiltered result"
        );
        into_map(data)
      }
      Err(e) => {
        warn!(
          resolution_id = %resolution.id,
          error = %e,
          "result filter failed, keeping unfiltered result"
        );
        into_map(data)
      }
    }
  }
}

fn into_map(value: Value) -> Map<String, Value> {
  match value {
    Value::Object(map) => map,
    _ => Map::new(),
  }
}
