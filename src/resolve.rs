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
use crate::error::ResolveError;
use crate::explore::DEFAULT_PATH;
use crate::explore::MAIN_PATH;
use crate::explore::interop_payload;
use crate::value::Value;

/// What a path lookup landed on.
#[derive(Debug, Clone)]
pub enum Resolution {
  Found(Value),
  NotFound,
  NotCallable(Value),
}

/// Looks up the value at `path` below `root`.
///
/// `main` is the root itself and `default` is the root's `default` member
/// (or the root when it has none). Other paths are walked segment by segment;
/// a missing segment, a non-object intermediate, or a throwing read all end
/// the walk as [`Resolution::NotFound`].
///
/// When the explorer would list the module through its `default` payload,
/// the payload is walked first and the root only afterwards, so a root member
/// never shadows the payload member of the same name. Otherwise the root is
/// walked first and an object-valued `default` is the fallback.
pub fn resolve(root: &Value, path: &str) -> Resolution {
  let found = match path {
    MAIN_PATH => Some(root.clone()),
    DEFAULT_PATH => match root.get(DEFAULT_PATH) {
      Ok(Value::Undefined) | Err(_) => Some(root.clone()),
      Ok(default) => Some(default),
    },
    _ => match interop_root(root) {
      Some(payload) => walk(&payload, path).or_else(|| walk(root, path)),
      None => walk(root, path).or_else(|| {
        let default = root.get(DEFAULT_PATH).ok()?;
        default.as_object()?;
        walk(&default, path)
      }),
    },
  };

  match found {
    Some(value) if value.is_callable() => Resolution::Found(value),
    Some(value) if !value.is_undefined() => Resolution::NotCallable(value),
    _ => Resolution::NotFound,
  }
}

/// The `default` payload the explorer re-roots at, if any.
fn interop_root(root: &Value) -> Option<Value> {
  let obj = root.as_object()?;
  let keys = obj.own_keys().ok()?;
  let default = obj.get(DEFAULT_PATH).ok()?;
  interop_payload(obj, &keys, &default).map(|(payload, _)| Value::Object(payload.clone()))
}

/// Resolves `path` and insists on a callable.
pub fn resolve_callable(root: &Value, path: &str) -> Result<Value, ResolveError> {
  match resolve(root, path) {
    Resolution::Found(callable) => Ok(callable),
    Resolution::NotFound => Err(ResolveError::NotFound {
      path: path.to_string(),
    }),
    Resolution::NotCallable(value) => Err(ResolveError::NotCallable {
      path: path.to_string(),
      kind: value.kind(),
    }),
  }
}

fn walk(root: &Value, path: &str) -> Option<Value> {
  if path.is_empty() {
    return None;
  }
  let mut current = root.clone();
  for segment in path.split('.') {
    let obj = current.as_object()?;
    current = match obj.get(segment) {
      Ok(Value::Undefined) => return None,
      Ok(value) => value,
      Err(e) => {
        tracing::debug!(%path, %segment, error = %e, "Read threw while resolving export path");
        return None;
      }
    };
  }
  Some(current)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::explore::Explorer;
  use crate::value::Exception;
  use crate::value::Object;

  fn answer(n: i32) -> Value {
    Value::function(move |_| Ok(Value::from(n)))
  }

  fn call(value: Value) -> f64 {
    value.call(&[]).unwrap().as_f64().unwrap()
  }

  #[test]
  fn test_dotted_path() {
    let root: Value = Object::new()
      .with("utils", Object::new().with("math", Object::new().with("double", answer(2))))
      .into();
    let found = resolve_callable(&root, "utils.math.double").unwrap();
    assert_eq!(call(found), 2.0);
  }

  #[test]
  fn test_missing_path_is_not_found() {
    let root: Value = Object::new().with("present", answer(1)).into();
    assert_eq!(
      resolve_callable(&root, "missing.path").unwrap_err(),
      ResolveError::NotFound {
        path: "missing.path".to_string()
      }
    );
    assert!(matches!(resolve(&root, "present.deeper"), Resolution::NotFound));
    assert!(matches!(resolve(&root, ""), Resolution::NotFound));
    assert!(matches!(resolve(&Value::Null, "x"), Resolution::NotFound));
  }

  #[test]
  fn test_non_callable_is_distinct() {
    let root: Value = Object::new().with("version", "1.2.3").with("nothing", Value::Null).into();
    assert_eq!(
      resolve_callable(&root, "version").unwrap_err(),
      ResolveError::NotCallable {
        path: "version".to_string(),
        kind: "string"
      }
    );
    assert!(matches!(resolve(&root, "nothing"), Resolution::NotCallable(Value::Null)));
  }

  #[test]
  fn test_throwing_getter_is_not_found() {
    let root = Object::new();
    root.define_getter("trap", |_| Err(Exception::new("denied")));
    assert!(matches!(resolve(&root.into(), "trap.inner"), Resolution::NotFound));
  }

  #[test]
  fn test_main_and_default() {
    let root: Value = Object::function(|_| Ok(Value::from(0))).into();
    assert_eq!(call(resolve_callable(&root, "main").unwrap()), 0.0);
    // no distinguishable default: the root is its own default
    assert_eq!(call(resolve_callable(&root, "default").unwrap()), 0.0);

    let wrapped: Value = Object::new().with("default", answer(9)).into();
    assert_eq!(call(resolve_callable(&wrapped, "default").unwrap()), 9.0);
    assert!(matches!(
      resolve_callable(&wrapped, "main"),
      Err(ResolveError::NotCallable { kind: "object", .. })
    ));
  }

  #[test]
  fn test_falls_back_to_default_payload() {
    let root: Value = Object::new()
      .with("default", Object::new().with("inner", answer(5)))
      .into();
    assert_eq!(call(resolve_callable(&root, "inner").unwrap()), 5.0);
    assert_eq!(call(resolve_callable(&root, "default.inner").unwrap()), 5.0);
  }

  #[test]
  fn test_payload_members_win_over_root_members() {
    let payload = Object::new()
      .with("a", answer(20))
      .with("b", answer(21))
      .with("c", answer(22));
    let root: Value = Object::new()
      .with("a", answer(10))
      .with("b", 1)
      .with("default", payload)
      .into();

    assert_eq!(call(resolve_callable(&root, "a").unwrap()), 20.0);
    assert_eq!(call(resolve_callable(&root, "b").unwrap()), 21.0);
    assert_eq!(call(resolve_callable(&root, "c").unwrap()), 22.0);
    assert_eq!(call(resolve_callable(&root, "default.a").unwrap()), 20.0);
  }

  #[test]
  fn test_listed_paths_resolve_to_callables() {
    let payload = Object::new()
      .with("x", answer(1))
      .with("y", "not a function")
      .with("nested", Object::new().with("z", answer(3)));
    let root: Value = Object::new()
      .with("y", answer(2))
      .with("default", payload.with("w", answer(4)))
      .into();

    let entries = Explorer::default().explore(&root).unwrap();
    assert!(!entries.is_empty());
    for entry in entries {
      assert!(
        resolve_callable(&root, &entry.path).is_ok(),
        "listed path {} did not resolve",
        entry.path
      );
    }
  }
}
