use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;
use trellis_config::{CallDef, PAGINATION_KEY};

use crate::error::GraphError;

/// A validated call set with its execution schedule.
#[derive(Debug, Clone)]
pub struct CallGraph {
  /// Calls keyed by name.
  calls: HashMap<String, CallDef>,
  /// Topological order.
  order: Vec<String>,
}

impl CallGraph {
  /// Validate the calls and compute their schedule.
  ///
  /// Fails on duplicate names, dependencies on unknown calls and cycles. No
  /// order is produced for a rejected set.
  pub fn build(calls: Vec<CallDef>) -> Result<Self, GraphError> {
    let names = validate(&calls)?;

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    // Initialize all calls
    for name in &names {
      adjacency.entry(name.to_string()).or_default();
      in_degree.insert(*name, 0);
    }

    // Build adjacency lists
    for call in &calls {
      if let Some(dependency) = call.dependency() {
        adjacency
          .entry(dependency.to_string())
          .or_default()
          .push(call.name.clone());
        *in_degree.entry(call.name.as_str()).or_default() += 1;
      }
    }

    // Kahn's algorithm with the frontier seeded in input order
    let mut frontier: VecDeque<&str> = names
      .iter()
      .copied()
      .filter(|name| in_degree.get(name) == Some(&0))
      .collect();
    let mut order = Vec::with_capacity(names.len());

    while let Some(name) = frontier.pop_front() {
      order.push(name.to_string());
      for dependent in adjacency.get(name).map(|v| v.as_slice()).unwrap_or(&[]) {
        if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
          *degree -= 1;
          if *degree == 0 {
            frontier.push_back(dependent.as_str());
          }
        }
      }
    }

    if order.len() < names.len() {
      let scheduled: HashSet<&str> = order.iter().map(|s| s.as_str()).collect();
      let remaining = names
        .iter()
        .filter(|name| !scheduled.contains(*name))
        .map(|name| name.to_string())
        .collect();
      return Err(GraphError::CycleDetected { remaining });
    }

    debug!(order = ?order, "call graph ordered");

    let calls = calls
      .into_iter()
      .map(|call| (call.name.clone(), call))
      .collect();

    Ok(Self { calls, order })
  }

  /// Call names in execution order.
  pub fn order(&self) -> &[String] {
    &self.order
  }

  /// Get a call by name.
  pub fn get(&self, name: &str) -> Option<&CallDef> {
    self.calls.get(name)
  }

  /// Calls in execution order.
  pub fn iter(&self) -> impl Iterator<Item = &CallDef> {
    self.order.iter().filter_map(|name| self.calls.get(name))
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }
}

/// Order calls so every call appears after the call it depends on.
pub fn sort(calls: &[CallDef]) -> Result<Vec<String>, GraphError> {
  CallGraph::build(calls.to_vec()).map(|graph| graph.order)
}

/// Check names are unique, unreserved and dependencies known. Returns names in
/// input order.
fn validate(calls: &[CallDef]) -> Result<Vec<&str>, GraphError> {
  let mut seen = HashSet::new();
  let mut names = Vec::with_capacity(calls.len());
  for call in calls {
    if call.name == PAGINATION_KEY || call.error_key() == PAGINATION_KEY {
      return Err(GraphError::ReservedName {
        name: call.name.clone(),
        key: PAGINATION_KEY.to_string(),
      });
    }
    if !seen.insert(call.name.as_str()) {
      return Err(GraphError::DuplicateName {
        name: call.name.clone(),
      });
    }
    names.push(call.name.as_str());
  }

  for call in calls {
    if let Some(dependency) = call.dependency()
      && !seen.contains(dependency)
    {
      return Err(GraphError::UnknownDependency {
        name: call.name.clone(),
        dependency: dependency.to_string(),
      });
    }
  }

  Ok(names)
}

#[cfg(test)]
mod tests {
  use super::*;
  use trellis_config::DependsOn;

  fn call(name: &str) -> CallDef {
    CallDef::new(name, format!("/{}", name))
  }

  fn dependent(name: &str, on: &str) -> CallDef {
    let mut call = call(name);
    call.depends_on = Some(DependsOn {
      name: on.to_string(),
      iterator: None,
    });
    call
  }

  fn index(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
  }

  #[test]
  fn test_sort_respects_edges() {
    let calls = vec![
      dependent("api1", "api3"),
      dependent("api3", "api2"),
      call("api2"),
      call("api4"),
    ];

    let order = sort(&calls).unwrap();

    assert_eq!(order.len(), 4);
    assert!(index(&order, "api2") < index(&order, "api3"));
    assert!(index(&order, "api3") < index(&order, "api1"));
  }

  #[test]
  fn test_sort_is_deterministic() {
    let calls = vec![
      dependent("api1", "api3"),
      dependent("api3", "api2"),
      call("api2"),
      call("api4"),
    ];

    let order = sort(&calls).unwrap();
    assert_eq!(order, vec!["api2", "api4", "api3", "api1"]);

    for _ in 0..10 {
      assert_eq!(sort(&calls).unwrap(), order);
    }
  }

  #[test]
  fn test_independent_calls_keep_input_order() {
    let calls = vec![call("c"), call("a"), call("b")];
    assert_eq!(sort(&calls).unwrap(), vec!["c", "a", "b"]);
  }

  #[test]
  fn test_fan_out_follows_parent() {
    let calls = vec![
      dependent("x", "root"),
      call("root"),
      dependent("y", "root"),
      dependent("z", "y"),
    ];

    let graph = CallGraph::build(calls).unwrap();

    assert_eq!(graph.order(), &["root", "x", "y", "z"]);
    assert_eq!(graph.get("z").unwrap().dependency(), Some("y"));
  }

  #[test]
  fn test_cycle_rejected() {
    let calls = vec![dependent("a", "b"), dependent("b", "a"), call("c")];

    let result = CallGraph::build(calls);

    assert_eq!(
      result.unwrap_err(),
      GraphError::CycleDetected {
        remaining: vec!["a".to_string(), "b".to_string()],
      }
    );
  }

  #[test]
  fn test_self_dependency_is_a_cycle() {
    let result = sort(&[dependent("a", "a")]);
    assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
  }

  #[test]
  fn test_unknown_dependency_rejected() {
    let result = sort(&[call("a"), dependent("b", "typo")]);

    assert_eq!(
      result.unwrap_err(),
      GraphError::UnknownDependency {
        name: "b".to_string(),
        dependency: "typo".to_string(),
      }
    );
  }

  #[test]
  fn test_duplicate_name_rejected() {
    let result = sort(&[call("a"), call("a")]);
    assert!(matches!(result, Err(GraphError::DuplicateName { .. })));
  }

  #[test]
  fn test_reserved_name_rejected() {
    let result = sort(&[call("a"), call("slice")]);
    assert_eq!(
      result.unwrap_err(),
      GraphError::ReservedName {
        name: "slice".to_string(),
        key: "slice".to_string(),
      }
    );

    let mut reserved_error_key = call("b");
    reserved_error_key.error_key = Some("slice".to_string());
    let result = sort(&[reserved_error_key]);
    assert!(matches!(result, Err(GraphError::ReservedName { ref name, .. }) if name == "b"));
  }

  #[test]
  fn test_iter_follows_order() {
    let graph = CallGraph::build(vec![dependent("b", "a"), call("a")]).unwrap();
    let names: Vec<&str> = graph.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(graph.len(), 2);
    assert!(!graph.is_empty());
  }
}
