//! The shared result dictionary.
//!
//! Every call's outcome is stored under its name (or its error key) and is
//! visible to the templates of every later call.

use serde::{Deserialize, Serialize};
use serde_json::map::Entry;
use serde_json::{Map, Value, json};
use tracing::warn;
use trellis_expr::Evaluator;

pub use trellis_config::PAGINATION_KEY;

/// Pagination context made available to templates and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: u64,
  pub per_page: u64,
  pub offset: u64,
}

impl Pagination {
  /// Context for a 1-based `page` of `per_page` items. `None` unless both are
  /// positive.
  pub fn new(per_page: u64, page: u64) -> Option<Self> {
    if per_page == 0 || page == 0 {
      return None;
    }
    Some(Self {
      page,
      per_page,
      offset: (page - 1).saturating_mul(per_page),
    })
  }

  pub fn to_value(&self) -> Value {
    json!({ "page": self.page, "perPage": self.per_page, "offset": self.offset })
  }
}

/// JSON object accumulating call results.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
  // Always a `Value::Object`.
  value: Value,
}

impl Dictionary {
  pub fn new() -> Self {
    Self {
      value: Value::Object(Map::new()),
    }
  }

  /// The dictionary as an evaluation context.
  pub fn as_value(&self) -> &Value {
    &self.value
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.value.get(key)
  }

  /// Store `value` under `key`, replacing any previous value.
  pub fn insert(&mut self, key: &str, value: Value) {
    if let Some(map) = self.value.as_object_mut() {
      map.insert(key.to_string(), value);
    }
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.value.as_object_mut().and_then(|map| map.remove(key))
  }

  /// Merge a response into `key`.
  ///
  /// - absent: stored as is
  /// - existing array: `value` is appended, or its elements if it is an array
  /// - existing non-array: replaced by `[existing, value]`, splicing the
  ///   elements of `value` if it is an array
  pub fn merge(&mut self, key: &str, value: Value) {
    let Some(map) = self.value.as_object_mut() else {
      return;
    };

    match map.entry(key) {
      Entry::Vacant(entry) => {
        entry.insert(value);
      }
      Entry::Occupied(mut entry) => match entry.get_mut() {
        Value::Array(items) => append(items, value),
        existing => {
          let mut items = vec![existing.take()];
          append(&mut items, value);
          *existing = Value::Array(items);
        }
      },
    }
  }

  /// Evaluate a call's `filter` against its decoded response and merge the
  /// result into `key`.
  ///
  /// The filter sees `{ <key>: decoded, "slice": <pagination> }`. A failing
  /// filter is logged and the unfiltered response is merged.
  pub fn merge_filtered(
    &mut self,
    key: &str,
    decoded: Value,
    filter: Option<&str>,
    evaluator: &dyn Evaluator,
  ) {
    let value = match filter {
      Some(filter) if !filter.trim().is_empty() => self.apply_filter(key, decoded, filter, evaluator),
      _ => decoded,
    };
    self.merge(key, value);
  }

  fn apply_filter(&self, key: &str, decoded: Value, filter: &str, evaluator: &dyn Evaluator) -> Value {
    let mut wrapper = Map::new();
    if let Some(pagination) = self.get(PAGINATION_KEY) {
      wrapper.insert(PAGINATION_KEY.to_string(), pagination.clone());
    }
    wrapper.insert(key.to_string(), decoded);
    let wrapper = Value::Object(wrapper);

    match evaluator.eval_value(filter, &wrapper) {
      Ok(filtered) => filtered,
      Err(e) => {
        warn!(call = %key, filter = %filter, error = %e, "filter failed, keeping unfiltered response");
        match wrapper {
          Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
          _ => Value::Null,
        }
      }
    }
  }

  pub fn into_map(self) -> Map<String, Value> {
    match self.value {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.value.as_object().map(|m| m.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for Dictionary {
  fn default() -> Self {
    Self::new()
  }
}

fn append(items: &mut Vec<Value>, value: Value) {
  match value {
    Value::Array(more) => items.extend(more),
    other => items.push(other),
  }
}
