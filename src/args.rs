// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::error::ArgumentError;
use crate::value::Value;

/// Positional call arguments, fixed once parsed.
pub type ArgumentList = Vec<Value>;

/// Parses user-supplied argument text.
///
/// - Blank input means no arguments.
/// - A JSON array is the argument list itself; any other JSON value is the
///   single argument.
/// - Text opening with `[` or `{` that is not valid JSON is an error, never
///   a string. That covers both closed (`[1,2,]`) and truncated (`[1,2,`)
///   structures.
/// - Anything else is passed through as one string argument.
pub fn parse_arguments(raw: &str) -> Result<ArgumentList, ArgumentError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(Vec::new());
  }

  match serde_json::from_str::<serde_json::Value>(trimmed) {
    Ok(serde_json::Value::Array(items)) => Ok(items.into_iter().map(Value::from).collect()),
    Ok(single) => Ok(vec![Value::from(single)]),
    Err(source) if looks_structured(trimmed) => Err(ArgumentError::MalformedStructured {
      input: trimmed.to_string(),
      source,
    }),
    Err(_) => Ok(vec![Value::String(trimmed.to_string())]),
  }
}

fn looks_structured(text: &str) -> bool {
  text.starts_with('[') || text.starts_with('{')
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn parsed(raw: &str) -> Vec<serde_json::Value> {
    parse_arguments(raw)
      .unwrap()
      .iter()
      .map(|v| v.to_json().unwrap())
      .collect()
  }

  #[test]
  fn test_blank_input_is_empty() {
    for n in 0..8 {
      assert!(parse_arguments(&" ".repeat(n)).unwrap().is_empty());
    }
    assert!(parse_arguments("\t\n ").unwrap().is_empty());
  }

  #[test]
  fn test_array_is_the_argument_list() {
    assert!(parsed("[]").is_empty());
    assert_eq!(parsed(r#"["a","b"]"#), vec![json!("a"), json!("b")]);
    assert_eq!(parsed("[1, [2, 3], null]"), vec![json!(1), json!([2, 3]), json!(null)]);
  }

  #[test]
  fn test_other_json_is_a_single_argument() {
    assert_eq!(parsed(r#"{"x":1}"#), vec![json!({"x": 1})]);
    assert_eq!(parsed("21"), vec![json!(21)]);
    assert_eq!(parsed("true"), vec![json!(true)]);
    assert_eq!(parsed("null"), vec![json!(null)]);
    assert_eq!(parsed(r#""quoted""#), vec![json!("quoted")]);
  }

  #[test]
  fn test_plain_text_is_a_literal_string() {
    assert_eq!(parsed("hello world"), vec![json!("hello world")]);
    assert_eq!(parsed("  padded  "), vec![json!("padded")]);
    assert_eq!(parsed("a [b]"), vec![json!("a [b]")]);
    assert_eq!(parsed("1,2"), vec![json!("1,2")]);
  }

  #[test]
  fn test_malformed_structured_input_fails() {
    let err = parse_arguments("[1,2,").unwrap_err();
    assert!(matches!(err, ArgumentError::MalformedStructured { .. }));

    let err = parse_arguments("[1,2,]").unwrap_err();
    assert!(matches!(err, ArgumentError::MalformedStructured { ref input, .. } if input == "[1,2,]"));

    assert!(parse_arguments("{x: 1}").is_err());
    assert!(parse_arguments("[unbalanced").is_err());
  }
}
