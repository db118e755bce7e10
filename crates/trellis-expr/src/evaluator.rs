use serde_json::Value;

use crate::error::EvalError;

/// Evaluates queries against JSON values.
///
/// Implementations must be safe to share between concurrent resolutions.
pub trait Evaluator: Send + Sync {
  /// Evaluate `query` against `data`, returning the result as JSON text.
  fn eval(&self, query: &str, data: &Value) -> Result<String, EvalError>;

  /// Evaluate `query` against `data` and decode the result.
  fn eval_value(&self, query: &str, data: &Value) -> Result<Value, EvalError> {
    let text = self.eval(query, data)?;
    serde_json::from_str(&text).map_err(|e| EvalError::Output {
      query: query.to_string(),
      message: e.to_string(),
    })
  }

  /// Invoke `action` for each element of the array `query` yields.
  ///
  /// Fails without calling `action` when the result is not an array.
  fn for_each(
    &self,
    query: &str,
    data: &Value,
    action: &mut dyn FnMut(&Value) -> Result<(), EvalError>,
  ) -> Result<(), EvalError> {
    match self.eval_value(query, data)? {
      Value::Array(items) => {
        for item in &items {
          action(item)?;
        }
        Ok(())
      }
      other => Err(EvalError::NotAnArray {
        query: query.to_string(),
        found: json_kind(&other).to_string(),
      }),
    }
  }
}

/// Name of a JSON value's type, as used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  /// Evaluator that only understands `.` and `.<key>`.
  struct KeyEvaluator;

  impl Evaluator for KeyEvaluator {
    fn eval(&self, query: &str, data: &Value) -> Result<String, EvalError> {
      let value = match query.strip_prefix('.') {
        Some("") => data.clone(),
        Some(key) => data.get(key).cloned().unwrap_or(Value::Null),
        None => {
          return Err(EvalError::Parse {
            query: query.to_string(),
            message: "expected a path".to_string(),
          });
        }
      };
      Ok(value.to_string())
    }
  }

  #[test]
  fn test_eval_value_decodes() {
    let data = json!({ "a": { "b": 1 } });
    assert_eq!(KeyEvaluator.eval_value(".a", &data).unwrap(), json!({ "b": 1 }));
  }

  #[test]
  fn test_for_each_visits_elements() {
    let data = json!({ "items": [1, "two", { "three": 3 }] });
    let mut seen = Vec::new();

    KeyEvaluator
      .for_each(".items", &data, &mut |item| {
        seen.push(item.clone());
        Ok(())
      })
      .unwrap();

    assert_eq!(seen, vec![json!(1), json!("two"), json!({ "three": 3 })]);
  }

  #[test]
  fn test_for_each_requires_array() {
    let data = json!({ "items": { "a": 1 } });
    let mut calls = 0;

    let result = KeyEvaluator.for_each(".items", &data, &mut |_| {
      calls += 1;
      Ok(())
    });

    assert_eq!(
      result,
      Err(EvalError::NotAnArray {
        query: ".items".to_string(),
        found: "object".to_string(),
      })
    );
    assert_eq!(calls, 0);
  }

  #[test]
  fn test_for_each_stops_on_action_error() {
    let data = json!({ "items": [1, 2, 3] });
    let mut calls = 0;

    let result = KeyEvaluator.for_each(".items", &data, &mut |_| {
      calls += 1;
      Err(EvalError::Runtime {
        query: "action".to_string(),
        message: "stop".to_string(),
      })
    });

    assert!(result.is_err());
    assert_eq!(calls, 1);
  }
}
