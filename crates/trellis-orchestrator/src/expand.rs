//! Call expansion.
//!
//! A call expands to one request, or to one request per element of its
//! dependency iterator. For fan-out, every `${ expr }` of the call is rebased
//! onto the element, so `${ .metadata.name }` means the name of the i-th
//! element.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use trellis_config::CallDef;
use trellis_expr::{Evaluator, Template, rebase_prefix};

use crate::error::ExpandError;

/// One concrete request produced from a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
  pub path: String,
  pub verb: String,
  pub headers: Vec<String>,
  pub payload: Option<String>,
}

/// Expand `call` against the result dictionary `data`.
///
/// An iterator that fails to evaluate, or does not yield an array, degrades to
/// a single request evaluated against the whole dictionary. An empty array
/// yields no requests.
///
/// With `lenient` set, failed expressions render as their error text instead
/// of failing the expansion.
pub fn expand(
  call: &CallDef,
  data: &Value,
  evaluator: &dyn Evaluator,
  lenient: bool,
) -> Result<Vec<ResolvedRequest>, ExpandError> {
  let templates = CallTemplates::parse(call);
  let renderer = Renderer {
    call,
    data,
    evaluator,
    lenient,
  };

  let Some(iterator) = call.iterator() else {
    return Ok(vec![renderer.render(&templates, None)?]);
  };

  match count(evaluator, iterator, data) {
    Ok(len) => (0..len)
      .map(|index| renderer.render(&templates, Some(&rebase_prefix(iterator, index))))
      .collect(),
    Err(e) => {
      warn!(
        call = %call.name,
        iterator = %iterator,
        error = %e,
        "iterator evaluation failed, expanding once"
      );
      Ok(vec![renderer.render(&templates, None)?])
    }
  }
}

fn count(
  evaluator: &dyn Evaluator,
  iterator: &str,
  data: &Value,
) -> Result<usize, trellis_expr::EvalError> {
  let mut len = 0;
  evaluator.for_each(iterator, data, &mut |_| {
    len += 1;
    Ok(())
  })?;
  Ok(len)
}

/// Templated fields of a call, parsed once per expansion.
struct CallTemplates {
  path: Template,
  headers: Vec<Template>,
  payload: Option<Template>,
}

impl CallTemplates {
  fn parse(call: &CallDef) -> Self {
    Self {
      path: Template::parse(&call.path),
      headers: call.headers.iter().map(|h| Template::parse(h)).collect(),
      payload: call.payload.as_deref().map(Template::parse),
    }
  }
}

struct Renderer<'a> {
  call: &'a CallDef,
  data: &'a Value,
  evaluator: &'a dyn Evaluator,
  lenient: bool,
}

impl Renderer<'_> {
  fn render(
    &self,
    templates: &CallTemplates,
    prefix: Option<&str>,
  ) -> Result<ResolvedRequest, ExpandError> {
    let path = self.field(&templates.path, "path", prefix)?;

    let headers = templates
      .headers
      .iter()
      .enumerate()
      .map(|(i, header)| self.field(header, &format!("headers[{}]", i), prefix))
      .collect::<Result<Vec<_>, _>>()?;

    let payload = templates
      .payload
      .as_ref()
      .map(|payload| self.field(payload, "payload", prefix))
      .transpose()?;

    Ok(ResolvedRequest {
      path,
      verb: self.call.verb().to_uppercase(),
      headers,
      payload,
    })
  }

  fn field(
    &self,
    template: &Template,
    field: &str,
    prefix: Option<&str>,
  ) -> Result<String, ExpandError> {
    if self.lenient {
      return Ok(template.render_lenient(self.evaluator, self.data, prefix));
    }

    template
      .render(self.evaluator, self.data, prefix)
      .map_err(|e| ExpandError::Template {
        call: self.call.name.clone(),
        field: field.to_string(),
        message: e.to_string(),
      })
  }
}
