//! `${ <expr> }` templates.
//!
//! A string is a template when it contains at least one `${ ... }` span. The
//! closing brace is found by tracking brace depth, so expressions may build
//! objects (`${ { id: .user.id } }`). Braces inside double-quoted string
//! literals are ignored. An unterminated span is left as literal text.
//!
//! Rendering replaces every span with its evaluated value: strings are
//! inserted without quotes, anything else as JSON text.
//!
//! ```text
//! "/api/v1/namespaces/${ .ns.items[0].metadata.name }/pods"
//!   -> "/api/v1/namespaces/demo-system/pods"
//! ```

use serde_json::Value;

use crate::error::EvalError;
use crate::evaluator::Evaluator;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
  Literal(String),
  Expr(String),
}

/// A parsed template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  parts: Vec<Part>,
}

impl Template {
  pub fn parse(source: &str) -> Self {
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find("${") {
      let open = cursor + offset;
      let expr_start = open + 2;
      let Some(close) = closing_brace(source, expr_start) else {
        break;
      };

      if open > literal_start {
        parts.push(Part::Literal(source[literal_start..open].to_string()));
      }
      parts.push(Part::Expr(source[expr_start..close].trim().to_string()));

      cursor = close + 1;
      literal_start = cursor;
    }

    if literal_start < source.len() {
      parts.push(Part::Literal(source[literal_start..].to_string()));
    }

    Self { parts }
  }

  pub fn parts(&self) -> &[Part] {
    &self.parts
  }

  /// Whether the source contained any `${ ... }` span.
  pub fn is_template(&self) -> bool {
    self.parts.iter().any(|p| matches!(p, Part::Expr(_)))
  }

  /// Render every span, failing on the first evaluation error.
  ///
  /// `prefix` is inserted in front of every expression, e.g. to rebase it
  /// onto an iterated element (see [`rebase_prefix`]).
  pub fn render(
    &self,
    evaluator: &dyn Evaluator,
    data: &Value,
    prefix: Option<&str>,
  ) -> Result<String, EvalError> {
    let mut out = String::new();
    for part in &self.parts {
      match part {
        Part::Literal(text) => out.push_str(text),
        Part::Expr(expr) => {
          let query = prefixed(prefix, expr);
          let text = evaluator.eval(&query, data)?;
          out.push_str(&unquote(&text));
        }
      }
    }
    Ok(out)
  }

  /// Render every span, substituting the error text for failed expressions.
  pub fn render_lenient(
    &self,
    evaluator: &dyn Evaluator,
    data: &Value,
    prefix: Option<&str>,
  ) -> String {
    let mut out = String::new();
    for part in &self.parts {
      match part {
        Part::Literal(text) => out.push_str(text),
        Part::Expr(expr) => {
          let query = prefixed(prefix, expr);
          match evaluator.eval(&query, data) {
            Ok(text) => out.push_str(&unquote(&text)),
            Err(e) => out.push_str(&e.to_string()),
          }
        }
      }
    }
    out
  }
}

/// Prefix that rebases an expression onto element `index` of `iterator`.
pub fn rebase_prefix(iterator: &str, index: usize) -> String {
  format!("{}[{}] | ", iterator.trim(), index)
}

fn prefixed(prefix: Option<&str>, expr: &str) -> String {
  match prefix {
    Some(prefix) => format!("{}{}", prefix, expr),
    None => expr.to_string(),
  }
}

/// Strings render bare, other values as their JSON text.
fn unquote(text: &str) -> String {
  match serde_json::from_str::<Value>(text) {
    Ok(Value::String(s)) => s,
    _ => text.trim().to_string(),
  }
}

/// Index of the `}` closing a span whose expression starts at `from`.
fn closing_brace(source: &str, from: usize) -> Option<usize> {
  let mut depth = 1usize;
  let mut in_string = false;
  let mut escaped = false;

  for (idx, c) in source[from..].char_indices() {
    if in_string {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_string = false;
      }
      continue;
    }

    match c {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some(from + idx);
        }
      }
      _ => {}
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jq::JqEvaluator;
  use serde_json::json;

  fn data() -> Value {
    json!({
      "ns": { "items": [
        { "metadata": { "name": "demo-system" } },
        { "metadata": { "name": "kube-system" } }
      ] },
      "count": 2
    })
  }

  #[test]
  fn test_plain_string_is_not_a_template() {
    let template = Template::parse("/api/v1/namespaces");

    assert!(!template.is_template());
    assert_eq!(
      template.render(&JqEvaluator, &data(), None).unwrap(),
      "/api/v1/namespaces"
    );
  }

  #[test]
  fn test_whole_string_expression() {
    let template =
      Template::parse(r#"${ "/api/v1/namespaces/" + (.ns.items[0].metadata.name) + "/pods" }"#);

    assert!(template.is_template());
    assert_eq!(
      template.render(&JqEvaluator, &data(), None).unwrap(),
      "/api/v1/namespaces/demo-system/pods"
    );
  }

  #[test]
  fn test_embedded_spans() {
    let template = Template::parse("/ns/${ .ns.items[1].metadata.name }/count/${ .count }");

    assert_eq!(
      template.parts(),
      &[
        Part::Literal("/ns/".to_string()),
        Part::Expr(".ns.items[1].metadata.name".to_string()),
        Part::Literal("/count/".to_string()),
        Part::Expr(".count".to_string()),
      ]
    );
    assert_eq!(
      template.render(&JqEvaluator, &data(), None).unwrap(),
      "/ns/kube-system/count/2"
    );
  }

  #[test]
  fn test_nested_braces() {
    let template = Template::parse("${ { first: .ns.items[0].metadata.name } }");

    assert_eq!(
      template.parts(),
      &[Part::Expr("{ first: .ns.items[0].metadata.name }".to_string())]
    );
    assert_eq!(
      template.render(&JqEvaluator, &data(), None).unwrap(),
      r#"{"first":"demo-system"}"#
    );
  }

  #[test]
  fn test_braces_inside_string_literals() {
    let template = Template::parse(r#"${ "}" + .ns.items[0].metadata.name }"#);

    assert_eq!(
      template.parts(),
      &[Part::Expr(r#""}" + .ns.items[0].metadata.name"#.to_string())]
    );
  }

  #[test]
  fn test_unterminated_span_is_literal() {
    let template = Template::parse("/a/${ .b");

    assert!(!template.is_template());
    assert_eq!(template.parts(), &[Part::Literal("/a/${ .b".to_string())]);
  }

  #[test]
  fn test_prefix_rebases_expression() {
    let template = Template::parse("/namespaces/${ .metadata.name }");
    let prefix = rebase_prefix(".ns.items", 1);

    assert_eq!(prefix, ".ns.items[1] | ");
    assert_eq!(
      template.render(&JqEvaluator, &data(), Some(&prefix)).unwrap(),
      "/namespaces/kube-system"
    );
  }

  #[test]
  fn test_strict_render_fails() {
    let template = Template::parse("/x/${ .count + \"a\" }");
    assert!(template.render(&JqEvaluator, &data(), None).is_err());
  }

  #[test]
  fn test_lenient_render_embeds_error_text() {
    let template = Template::parse("/x/${ .count + \"a\" }");

    let rendered = template.render_lenient(&JqEvaluator, &data(), None);

    assert!(rendered.starts_with("/x/failed to evaluate query"));
  }
}
