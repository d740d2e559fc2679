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
use crate::error::DiscoveryError;
use crate::value::Object;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Path recorded when the module root is itself callable.
pub const MAIN_PATH: &str = "main";

/// Path recorded when the root's `default` member is callable.
pub const DEFAULT_PATH: &str = "default";

/// Reflective members that are never API surface.
const RESERVED_NAMES: [&str; 6] = ["constructor", "prototype", "caller", "arguments", "name", "length"];

/// A discovered callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
  /// Dot-separated property path from the module root.
  pub path: String,
  /// Nesting level of the object holding the callable (root members are 0).
  pub depth: usize,
}

impl ExportEntry {
  /// Whether this is one of the `main`/`default` bookkeeping paths.
  pub fn is_meta(&self) -> bool {
    self.path == MAIN_PATH || self.path == DEFAULT_PATH
  }
}

/// Deduplicating, insertion-ordered set of entries.
#[derive(Default)]
struct Collected {
  entries: Vec<ExportEntry>,
  seen: HashSet<String>,
}

impl Collected {
  fn record(&mut self, path: &str, depth: usize) {
    if self.seen.insert(path.to_string()) {
      self.entries.push(ExportEntry {
        path: path.to_string(),
        depth,
      });
    }
  }
}

/// Enumerates the callables reachable from a module root without invoking them.
#[derive(Debug, Clone, Copy)]
pub struct Explorer {
  max_depth: usize,
  include_meta: bool,
}

impl Default for Explorer {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_DEPTH)
  }
}

impl Explorer {
  pub fn new(max_depth: usize) -> Self {
    Self {
      max_depth,
      include_meta: false,
    }
  }

  /// Keep the `main`/`default` bookkeeping paths in the result.
  pub fn include_meta(mut self, include_meta: bool) -> Self {
    self.include_meta = include_meta;
    self
  }

  /// Discovers every export path under `root` that resolves to a callable.
  ///
  /// Non-object roots (including `null`/`undefined`) have no exports. Members
  /// whose read throws are skipped, as are nested objects whose own keys
  /// cannot be enumerated. Only a failure to enumerate the root itself is an
  /// error.
  pub fn explore(&self, root: &Value) -> Result<Vec<ExportEntry>, DiscoveryError> {
    let Some(root) = root.as_object() else {
      return Ok(Vec::new());
    };
    let root_keys = own_keys(root)?;

    let mut collected = Collected::default();
    if root.is_callable() {
      collected.record(MAIN_PATH, 0);
    }
    let default = root.get(DEFAULT_PATH).unwrap_or_default();
    if default.is_callable() {
      collected.record(DEFAULT_PATH, 0);
    }

    let mut visited = HashSet::from([root.id()]);
    match interop_payload(root, &root_keys, &default) {
      Some((payload, payload_keys)) => {
        tracing::debug!("Exploring module through its default export");
        visited.insert(payload.id());
        self.walk(payload, payload_keys, None, 0, &mut visited, &mut collected);
      }
      None => self.walk(root, root_keys, None, 0, &mut visited, &mut collected),
    }

    let mut entries = collected.entries;
    if !self.include_meta {
      entries.retain(|entry| !entry.is_meta());
    }
    tracing::debug!(count = entries.len(), "Export discovery complete");
    Ok(entries)
  }

  fn walk(
    &self,
    node: &Object,
    keys: Vec<String>,
    prefix: Option<&str>,
    depth: usize,
    visited: &mut HashSet<usize>,
    collected: &mut Collected,
  ) {
    for key in keys {
      if is_hidden(&key) {
        continue;
      }
      let value = match node.get(&key) {
        Ok(value) => value,
        Err(e) => {
          tracing::debug!(%key, error = %e, "Skipping member whose read threw");
          continue;
        }
      };
      let Some(child) = value.as_object() else {
        continue;
      };

      let path = match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key,
      };
      if child.is_callable() {
        collected.record(&path, depth);
      }

      if depth < self.max_depth && visited.insert(child.id()) {
        match child.own_keys() {
          Ok(child_keys) => self.walk(child, child_keys, Some(&path), depth + 1, visited, collected),
          Err(e) => tracing::debug!(%path, error = %e, "Skipping member whose keys could not be enumerated"),
        }
      }
    }
  }
}

/// Picks the `default` payload as the traversal root when the module is an
/// interop wrapper around it, handing back the payload's own keys.
///
/// Two cases, mutually exclusive: the root exposes nothing but a `default`
/// object with several members; or the root has callables of its own but
/// `default` is an object carrying more of them. Path resolution consults the
/// same decision so every listed path resolves against the object it was
/// found on.
pub(crate) fn interop_payload<'a>(
  root: &Object,
  root_keys: &[String],
  default: &'a Value,
) -> Option<(&'a Object, Vec<String>)> {
  let payload = default.as_object()?;
  let payload_keys = payload.own_keys().ok()?;

  let visible: Vec<&String> = root_keys.iter().filter(|key| !is_hidden(key)).collect();
  if visible.len() == 1 && visible[0] == DEFAULT_PATH {
    return (payload_keys.len() > 1).then_some((payload, payload_keys));
  }

  let root_callables = count_callables(root, root_keys);
  if root_callables > 0 && !payload.is_callable() {
    let payload_callables = count_callables(payload, &payload_keys);
    if payload_callables > root_callables {
      return Some((payload, payload_keys));
    }
  }
  None
}

fn own_keys(obj: &Object) -> Result<Vec<String>, DiscoveryError> {
  obj.own_keys().map_err(|e| DiscoveryError::EnumerationFailed {
    message: e.message().to_string(),
  })
}

fn is_hidden(key: &str) -> bool {
  key.starts_with('_') || RESERVED_NAMES.contains(&key)
}

/// Counts the directly callable, visible members of `obj`, excluding `default`.
fn count_callables(obj: &Object, keys: &[String]) -> usize {
  keys
    .iter()
    .filter(|key| !is_hidden(key) && key.as_str() != DEFAULT_PATH)
    .filter(|key| obj.get(key).is_ok_and(|value| value.is_callable()))
    .count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::value::Exception;
  use std::sync::Arc;

  fn noop() -> Value {
    Value::function(|_| Ok(Value::Undefined))
  }

  fn paths(entries: &[ExportEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.path.as_str()).collect()
  }

  #[test]
  fn test_empty_and_null_roots() {
    let explorer = Explorer::default();
    assert!(explorer.explore(&Value::Object(Object::new())).unwrap().is_empty());
    assert!(explorer.explore(&Value::Null).unwrap().is_empty());
    assert!(explorer.explore(&Value::Undefined).unwrap().is_empty());
    assert!(explorer.explore(&Value::from(3)).unwrap().is_empty());
  }

  #[test]
  fn test_self_reference_terminates() {
    let obj = Object::new().with("f", noop());
    obj.set("self", obj.clone());
    let entries = Explorer::new(50).explore(&obj.into()).unwrap();
    assert_eq!(paths(&entries), vec!["f"]);
  }

  #[test]
  fn test_mutual_references_terminate() {
    let a = Object::new().with("fa", noop());
    let b = Object::new().with("fb", noop()).with("a", a.clone());
    a.set("b", b);
    let root = Object::new().with("a", a);
    let entries = Explorer::new(50).explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["a.fa", "a.b.fb"]);
  }

  #[test]
  fn test_hidden_and_reserved_members_excluded() {
    let root = Object::new()
      .with("_private", noop())
      .with("visible", noop())
      .with("constructor", noop())
      .with("prototype", Object::new().with("method", noop()))
      .with("name", noop())
      .with("length", noop())
      .with("caller", noop())
      .with("arguments", noop())
      .with("nested", Object::new().with("_secret", noop()).with("open", noop()));
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["visible", "nested.open"]);
    assert!(
      entries
        .iter()
        .all(|entry| !entry.path.rsplit('.').next().unwrap().starts_with('_'))
    );
  }

  #[test]
  fn test_depth_bound() {
    let deep = Object::new().with("leaf", noop());
    let mut node = deep;
    for level in (0..5).rev() {
      node = Object::new().with(format!("l{level}"), node);
    }
    let root: Value = node.into();

    let shallow = Explorer::new(1).explore(&root).unwrap();
    assert!(shallow.is_empty());

    let entries = Explorer::new(5).explore(&root).unwrap();
    assert_eq!(paths(&entries), vec!["l0.l1.l2.l3.l4.leaf"]);
    assert_eq!(entries[0].depth, 5);
  }

  #[test]
  fn test_throwing_getter_is_skipped() {
    let root = Object::new().with("before", noop());
    root.define_getter("hostile", |_| Err(Exception::new("getter exploded")));
    root.set("after", noop());
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["before", "after"]);
  }

  #[test]
  fn test_root_enumeration_failure_propagates() {
    let root = Object::with_keys_trap(|| Err(Exception::new("ownKeys trap")));
    let err = Explorer::default().explore(&root.into()).unwrap_err();
    assert!(matches!(err, DiscoveryError::EnumerationFailed { ref message } if message == "ownKeys trap"));
  }

  #[test]
  fn test_nested_enumeration_failure_is_skipped() {
    let trapped = Object::with_keys_trap(|| Err(Exception::new("ownKeys trap")));
    let root = Object::new().with("proxy", trapped).with("ok", noop());
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["ok"]);
  }

  #[test]
  fn test_callable_root_and_statics() {
    let root = Object::function(|_| Ok(Value::Null)).with("helper", noop());
    let hidden = Explorer::default().explore(&root.clone().into()).unwrap();
    assert_eq!(paths(&hidden), vec!["helper"]);

    let shown = Explorer::default().include_meta(true).explore(&root.into()).unwrap();
    assert_eq!(paths(&shown), vec!["main", "helper"]);
  }

  #[test]
  fn test_callable_default_is_recorded_first() {
    let default = Object::function(|_| Ok(Value::Null)).with("extra", noop());
    let root = Object::new().with("named", noop()).with("default", default);
    let entries = Explorer::default().include_meta(true).explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["default", "named", "default.extra"]);
  }

  #[test]
  fn test_commonjs_under_default_is_unwrapped() {
    let payload = Object::new()
      .with("camel", noop())
      .with("kebab", noop())
      .with("util", Object::new().with("words", noop()));
    let root = Object::new().with("default", payload).with("__esModule", true);
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["camel", "kebab", "util.words"]);
  }

  #[test]
  fn test_richer_default_is_preferred() {
    let payload = Object::new()
      .with("a", noop())
      .with("b", noop())
      .with("c", noop());
    let root = Object::new().with("only", noop()).with("default", payload);
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_poorer_default_is_explored_in_place() {
    let payload = Object::new().with("a", noop());
    let root = Object::new()
      .with("x", noop())
      .with("y", noop())
      .with("default", payload);
    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["x", "y", "default.a"]);
  }

  #[test]
  fn test_payload_keys_are_listed_once() {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let payload = Object::with_keys_trap(move || match counter.fetch_add(1, Ordering::SeqCst) {
      0 => Ok(vec!["first".to_string(), "second".to_string()]),
      _ => Err(Exception::new("keys already taken")),
    })
    .with("first", noop())
    .with("second", noop());
    let root = Object::new().with("default", payload);

    let entries = Explorer::default().explore(&root.into()).unwrap();
    assert_eq!(paths(&entries), vec!["first", "second"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
