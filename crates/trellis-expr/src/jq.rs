//! jq-backed [`Evaluator`].

use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

use crate::error::EvalError;
use crate::evaluator::Evaluator;

/// Evaluates jq queries.
///
/// Queries are parsed and compiled on every call; the evaluator holds no state
/// and can be shared freely.
///
/// A query producing a single output evaluates to that output. No output
/// evaluates to `null` and several outputs are collected into an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JqEvaluator;

impl JqEvaluator {
  pub fn new() -> Self {
    Self
  }

  /// Run `query` against `data` and collect every output.
  fn run(&self, query: &str, data: &Value) -> Result<Vec<Value>, EvalError> {
    let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = Arena::default();
    let program = File {
      code: query,
      path: (),
    };

    let modules = loader
      .load(&arena, program)
      .map_err(|errs| EvalError::Parse {
        query: query.to_string(),
        message: format!("{} syntax error(s)", errs.len()),
      })?;

    let filter = Compiler::default()
      .with_funs(jaq_std::funs().chain(jaq_json::funs()))
      .compile(modules)
      .map_err(|errs| EvalError::Compile {
        query: query.to_string(),
        message: format!("{} undefined filter(s) or variable(s)", errs.len()),
      })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut outputs = Vec::new();

    for output in filter.run((Ctx::new([], &inputs), Val::from(data.clone()))) {
      let val = output.map_err(|e| EvalError::Runtime {
        query: query.to_string(),
        message: e.to_string(),
      })?;
      let value = serde_json::from_str(&val.to_string()).map_err(|e| EvalError::Output {
        query: query.to_string(),
        message: e.to_string(),
      })?;
      outputs.push(value);
    }

    Ok(outputs)
  }
}

impl Evaluator for JqEvaluator {
  fn eval(&self, query: &str, data: &Value) -> Result<String, EvalError> {
    let mut outputs = self.run(query, data)?;
    let value = match outputs.len() {
      0 => Value::Null,
      1 => outputs.remove(0),
      _ => Value::Array(outputs),
    };
    Ok(value.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_path_lookup() {
    let data = json!({ "ns": { "items": [{ "metadata": { "name": "demo-system" } }] } });

    let result = JqEvaluator.eval(".ns.items[0].metadata.name", &data).unwrap();

    assert_eq!(result, r#""demo-system""#);
  }

  #[test]
  fn test_string_concatenation() {
    let data = json!({ "ns": { "items": [{ "metadata": { "name": "demo-system" } }] } });

    let result = JqEvaluator
      .eval_value(
        r#""/api/v1/namespaces/" + (.ns.items[0].metadata.name) + "/pods""#,
        &data,
      )
      .unwrap();

    assert_eq!(result, json!("/api/v1/namespaces/demo-system/pods"));
  }

  #[test]
  fn test_object_construction() {
    let data = json!({ "user": { "id": 7, "name": "ada" } });

    let result = JqEvaluator.eval_value("{ id: .user.id }", &data).unwrap();

    assert_eq!(result, json!({ "id": 7 }));
  }

  #[test]
  fn test_multiple_outputs_collected() {
    let data = json!({ "items": [1, 2, 3] });
    assert_eq!(JqEvaluator.eval_value(".items[]", &data).unwrap(), json!([1, 2, 3]));
  }

  #[test]
  fn test_no_output_is_null() {
    let data = json!({ "items": [] });
    assert_eq!(JqEvaluator.eval(".items[]", &data).unwrap(), "null");
  }

  #[test]
  fn test_for_each_over_iterated_values() {
    let data = json!({ "list": [{ "n": 1 }, { "n": 2 }, { "n": 3 }] });
    let mut names = Vec::new();

    JqEvaluator
      .for_each(".[]", &data, &mut |item| {
        names.push(item["n"].clone());
        Ok(())
      })
      .unwrap();

    assert_eq!(names, vec![json!(1), json!(2), json!(3)]);
  }

  #[test]
  fn test_parse_error() {
    let result = JqEvaluator.eval(".items[", &json!({}));
    assert!(matches!(result, Err(EvalError::Parse { .. })));
  }

  #[test]
  fn test_undefined_filter() {
    let result = JqEvaluator.eval("nosuchfilter(1)", &json!({}));
    assert!(matches!(result, Err(EvalError::Compile { .. })));
  }

  #[test]
  fn test_runtime_error() {
    let result = JqEvaluator.eval(".a + 1", &json!({ "a": "text" }));
    assert!(matches!(result, Err(EvalError::Runtime { .. })));
  }
}
