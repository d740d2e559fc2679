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

//! The dynamic value graph a loaded module is made of.
//!
//! Nothing about a module's shape is known ahead of time, so everything the
//! engine touches is a [`Value`]. Objects are shared, identity-bearing nodes;
//! a callable object is a "function" and may carry its own properties. Every
//! property read is fallible because accessors (and own-keys traps) may throw.
use serde_json::Map;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use thiserror::Error;

/// Native call behavior of a callable object. Arguments are applied positionally.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, Exception> + Send + Sync>;

/// Proxy-style own-keys trap, used in place of the object's own property list.
pub type KeysTrap = Arc<dyn Fn() -> Result<Vec<String>, Exception> + Send + Sync>;

type PendingFuture = Pin<Box<dyn Future<Output = Result<Value, Exception>> + Send>>;

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A thrown or rejected condition raised by module code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Exception {
  message: String,
}

impl Exception {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  /// Builds an exception from an arbitrary thrown value.
  ///
  /// Error-like objects contribute their `message` string; anything else is
  /// rendered with [`Value::to_display_string`].
  pub fn from_value(value: &Value) -> Self {
    if let Value::Object(obj) = value {
      if let Ok(Value::String(message)) = obj.get("message") {
        return Self::new(message);
      }
    }
    Self::new(value.to_display_string())
  }

  /// Converts back into an error-like object, e.g. to hand to a `reject` callback.
  pub fn into_value(self) -> Value {
    Value::Object(Object::new().with("message", self.message))
  }
}

#[derive(Clone)]
enum Property {
  Data(Value),
  Getter(NativeFn),
}

struct ObjectInner {
  call: Option<NativeFn>,
  own_keys: Option<KeysTrap>,
  properties: RwLock<Vec<(String, Property)>>,
}

/// A shared object node. Clones share identity.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
  fn from_parts(call: Option<NativeFn>, own_keys: Option<KeysTrap>) -> Self {
    Self(Arc::new(ObjectInner {
      call,
      own_keys,
      properties: RwLock::new(Vec::new()),
    }))
  }

  /// A plain, non-callable object.
  pub fn new() -> Self {
    Self::from_parts(None, None)
  }

  /// A callable object.
  pub fn function<F>(call: F) -> Self
  where
    F: Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
  {
    Self::from_parts(Some(Arc::new(call)), None)
  }

  /// A plain object whose key enumeration is delegated to `trap`.
  pub fn with_keys_trap<F>(trap: F) -> Self
  where
    F: Fn() -> Result<Vec<String>, Exception> + Send + Sync + 'static,
  {
    Self::from_parts(None, Some(Arc::new(trap)))
  }

  /// Identity of the underlying node, stable for the node's lifetime.
  pub fn id(&self) -> usize {
    Arc::as_ptr(&self.0) as usize
  }

  pub fn is_callable(&self) -> bool {
    self.0.call.is_some()
  }

  fn define(&self, key: String, property: Property) {
    let mut properties = self.0.properties.write().unwrap_or_else(PoisonError::into_inner);
    match properties.iter_mut().find(|(name, _)| *name == key) {
      Some((_, slot)) => *slot = property,
      None => properties.push((key, property)),
    }
  }

  /// Sets a data property, replacing any existing property of that name.
  pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
    self.define(key.into(), Property::Data(value.into()));
    self
  }

  /// Builder form of [`Object::set`].
  pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.set(key, value);
    self
  }

  /// Defines an accessor property evaluated on every read.
  pub fn define_getter<F>(&self, key: impl Into<String>, getter: F) -> &Self
  where
    F: Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
  {
    self.define(key.into(), Property::Getter(Arc::new(getter)));
    self
  }

  /// Own property names in definition order, or whatever the keys trap reports.
  pub fn own_keys(&self) -> Result<Vec<String>, Exception> {
    if let Some(trap) = &self.0.own_keys {
      return trap();
    }
    let properties = self.0.properties.read().unwrap_or_else(PoisonError::into_inner);
    Ok(properties.iter().map(|(name, _)| name.clone()).collect())
  }

  /// Reads a property. Missing properties read as [`Value::Undefined`].
  pub fn get(&self, key: &str) -> Result<Value, Exception> {
    // The lock is released before a getter runs; getters may write back.
    let property = {
      let properties = self.0.properties.read().unwrap_or_else(PoisonError::into_inner);
      properties
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, property)| property.clone())
    };
    match property {
      None => Ok(Value::Undefined),
      Some(Property::Data(value)) => Ok(value),
      Some(Property::Getter(getter)) => getter(&[]),
    }
  }

  pub fn call(&self, args: &[Value]) -> Result<Value, Exception> {
    match &self.0.call {
      Some(call) => call(args),
      None => Err(Exception::new("object is not a function")),
    }
  }
}

impl Default for Object {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Object")
      .field("id", &format_args!("{:#x}", self.id()))
      .field("callable", &self.is_callable())
      .finish_non_exhaustive()
  }
}

/// Any value a module can expose, take, or return.
#[derive(Debug, Clone, Default)]
pub enum Value {
  #[default]
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  Array(Vec<Value>),
  Object(Object),
}

impl Value {
  /// Shorthand for a callable object with no properties.
  pub fn function<F>(call: F) -> Self
  where
    F: Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
  {
    Value::Object(Object::function(call))
  }

  /// Wraps a future in a thenable.
  ///
  /// The first `then(resolve, reject)` call spawns the future on the current
  /// tokio runtime and settles through whichever callback applies.
  pub fn deferred<F>(future: F) -> Self
  where
    F: Future<Output = Result<Value, Exception>> + Send + 'static,
  {
    let pending: Mutex<Option<PendingFuture>> = Mutex::new(Some(Box::pin(future)));
    let then = Value::function(move |args| {
      let future = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .ok_or_else(|| Exception::new("deferred value was already awaited"))?;
      let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| Exception::new("deferred value awaited outside of an async runtime"))?;
      let resolve = args.first().cloned().unwrap_or_default();
      let reject = args.get(1).cloned().unwrap_or_default();
      runtime.spawn(async move {
        let settled = match future.await {
          Ok(value) => resolve.call(&[value]),
          Err(e) => reject.call(&[e.into_value()]),
        };
        if let Err(e) = settled {
          tracing::debug!(error = %e, "Settlement callback failed");
        }
      });
      Ok(Value::Undefined)
    });
    Value::Object(Object::new().with("then", then))
  }

  pub fn as_object(&self) -> Option<&Object> {
    match self {
      Value::Object(obj) => Some(obj),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Value::Undefined)
  }

  pub fn is_callable(&self) -> bool {
    self.as_object().is_some_and(Object::is_callable)
  }

  /// The `typeof`-style name of this value's kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "null",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Array(_) => "array",
      Value::Object(obj) if obj.is_callable() => "function",
      Value::Object(_) => "object",
    }
  }

  /// Invokes this value with no `this` binding.
  pub fn call(&self, args: &[Value]) -> Result<Value, Exception> {
    match self {
      Value::Object(obj) => obj.call(args),
      other => Err(Exception::new(format!("{} is not a function", other.kind()))),
    }
  }

  /// Reads a property; non-objects have none.
  pub fn get(&self, key: &str) -> Result<Value, Exception> {
    match self {
      Value::Object(obj) => obj.get(key),
      _ => Ok(Value::Undefined),
    }
  }

  /// Normalizes into a JSON-comparable form.
  ///
  /// Functions and `undefined` have no JSON form and yield `None`; inside
  /// arrays they become `null`, inside objects the member is dropped. Members
  /// whose getter throws are dropped as well. A reference back to an object
  /// already being normalized becomes the string `"[Circular]"`.
  pub fn to_json(&self) -> Option<serde_json::Value> {
    self.json_of(&mut Vec::new())
  }

  fn json_of(&self, ancestors: &mut Vec<usize>) -> Option<serde_json::Value> {
    use serde_json::Value as Json;
    match self {
      Value::Undefined => None,
      Value::Null => Some(Json::Null),
      Value::Bool(b) => Some(Json::Bool(*b)),
      Value::Number(n) => Some(number_to_json(*n)),
      Value::String(s) => Some(Json::String(s.clone())),
      Value::Array(items) => Some(Json::Array(
        items
          .iter()
          .map(|item| item.json_of(ancestors).unwrap_or(Json::Null))
          .collect(),
      )),
      Value::Object(obj) if obj.is_callable() => None,
      Value::Object(obj) => {
        if ancestors.contains(&obj.id()) {
          return Some(Json::String("[Circular]".to_string()));
        }
        ancestors.push(obj.id());
        let mut map = Map::new();
        for key in obj.own_keys().unwrap_or_default() {
          if let Some(json) = obj.get(&key).ok().and_then(|v| v.json_of(ancestors)) {
            map.insert(key, json);
          }
        }
        ancestors.pop();
        Some(Json::Object(map))
      }
    }
  }

  /// Human-readable rendering, used for thrown values and messages.
  pub fn to_display_string(&self) -> String {
    match self {
      Value::Undefined => "undefined".to_string(),
      Value::Null => "null".to_string(),
      Value::Bool(b) => b.to_string(),
      Value::Number(n) if n.is_nan() => "NaN".to_string(),
      Value::Number(n) if n.is_infinite() => if *n > 0.0 { "Infinity" } else { "-Infinity" }.to_string(),
      Value::Number(n) => number_to_json(*n).to_string(),
      Value::String(s) => s.clone(),
      Value::Array(items) => items
        .iter()
        .map(Value::to_display_string)
        .collect::<Vec<_>>()
        .join(","),
      Value::Object(obj) if obj.is_callable() => "[function]".to_string(),
      Value::Object(_) => "[object Object]".to_string(),
    }
  }
}

fn number_to_json(n: f64) -> serde_json::Value {
  if !n.is_finite() {
    return serde_json::Value::Null;
  }
  if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
    return serde_json::Value::from(n as i64);
  }
  serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl From<serde_json::Value> for Value {
  fn from(json: serde_json::Value) -> Self {
    use serde_json::Value as Json;
    match json {
      Json::Null => Value::Null,
      Json::Bool(b) => Value::Bool(b),
      Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
      Json::String(s) => Value::String(s),
      Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
      Json::Object(map) => {
        let obj = Object::new();
        for (key, value) in map {
          obj.set(key, Value::from(value));
        }
        Value::Object(obj)
      }
    }
  }
}

impl From<Object> for Value {
  fn from(obj: Object) -> Self {
    Value::Object(obj)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Value::Number(n)
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Value::Number(f64::from(n))
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::Array(items)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_clones_share_identity() {
    let obj = Object::new();
    let alias = obj.clone();
    alias.set("x", 1);
    assert_eq!(obj.id(), alias.id());
    assert_eq!(obj.get("x").unwrap().as_f64(), Some(1.0));
    assert_ne!(obj.id(), Object::new().id());
  }

  #[test]
  fn test_set_replaces_in_place() {
    let obj = Object::new().with("a", 1).with("b", 2).with("a", 3);
    assert_eq!(obj.own_keys().unwrap(), vec!["a", "b"]);
    assert_eq!(obj.get("a").unwrap().as_f64(), Some(3.0));
  }

  #[test]
  fn test_throwing_getter_surfaces_exception() {
    let obj = Object::new();
    obj.define_getter("boom", |_| Err(Exception::new("no touching")));
    assert_eq!(obj.get("boom").unwrap_err().message(), "no touching");
  }

  #[test]
  fn test_to_json_drops_functions_and_marks_cycles() {
    let obj = Object::new()
      .with("n", 42)
      .with("f", Value::function(|_| Ok(Value::Undefined)))
      .with("list", vec![Value::Undefined, Value::from("x")]);
    obj.set("me", obj.clone());

    assert_eq!(
      Value::from(obj).to_json(),
      Some(json!({"n": 42, "list": [null, "x"], "me": "[Circular]"}))
    );
    assert_eq!(Value::function(|_| Ok(Value::Null)).to_json(), None);
    assert_eq!(Value::Number(f64::NAN).to_json(), Some(json!(null)));
    assert_eq!(Value::Number(2.5).to_json(), Some(json!(2.5)));
  }

  #[test]
  fn test_exception_from_error_like_value() {
    let thrown = Exception::new("bad input").into_value();
    assert_eq!(Exception::from_value(&thrown).message(), "bad input");
    assert_eq!(Exception::from_value(&Value::from(7)).message(), "7");
  }

  #[test]
  fn test_calling_non_function_fails() {
    let err = Value::from("nope").call(&[]).unwrap_err();
    assert_eq!(err.message(), "string is not a function");
  }
}
