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

//! Demo packages bundled with the `duel` binary.
//!
//! Each one has a different export shape:
//!
//! * `case-kit`: namespace bag with nested utilities, private helpers and a
//!   non-callable version string.
//! * `case-kit-lite`: the same kind of API wrapped under `default`, as a
//!   CommonJS module looks through ES-module interop.
//! * `mathx`: a callable root (`double`) carrying static members.
//! * `mathx-async`: functions that return thenables.
use crate::loader::ModuleFactory;
use crate::value::Exception;
use crate::value::Object;
use crate::value::Value;
use std::time::Duration;

pub const BUILTIN: &[(&str, ModuleFactory)] = &[
  ("case-kit", case_kit),
  ("case-kit-lite", case_kit_lite),
  ("mathx", mathx),
  ("mathx-async", mathx_async),
];

fn string_arg(args: &[Value]) -> Result<&str, Exception> {
  args
    .first()
    .and_then(Value::as_str)
    .ok_or_else(|| Exception::new("TypeError: expected a string argument"))
}

fn number_arg(args: &[Value], index: usize) -> Result<f64, Exception> {
  args
    .get(index)
    .and_then(Value::as_f64)
    .ok_or_else(|| Exception::new(format!("TypeError: expected a number at position {index}")))
}

fn split_words(text: &str) -> Vec<String> {
  text
    .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
    .filter(|word| !word.is_empty())
    .map(str::to_lowercase)
    .collect()
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

fn camel_case(text: &str) -> String {
  split_words(text)
    .iter()
    .enumerate()
    .map(|(i, word)| if i == 0 { word.clone() } else { capitalize(word) })
    .collect()
}

fn pascal_case(text: &str) -> String {
  split_words(text).iter().map(|word| capitalize(word)).collect()
}

fn string_fn(transform: fn(&str) -> String) -> Value {
  Value::function(move |args| Ok(Value::String(transform(string_arg(args)?))))
}

fn case_kit() -> Value {
  let strings = Object::new()
    .with("capitalize", string_fn(capitalize))
    .with("reverse", string_fn(|s| s.chars().rev().collect()));

  Object::new()
    .with("VERSION", "2.1.0")
    .with("camelCase", string_fn(camel_case))
    .with("kebabCase", string_fn(|s| split_words(s).join("-")))
    .with("snakeCase", string_fn(|s| split_words(s).join("_")))
    .with(
      "words",
      Value::function(|args| {
        let words = split_words(string_arg(args)?);
        Ok(Value::Array(words.into_iter().map(Value::String).collect()))
      }),
    )
    .with("_normalize", string_fn(|s| s.trim().to_lowercase()))
    .with("strings", strings)
    .into()
}

fn case_kit_lite() -> Value {
  let payload = Object::new()
    .with("camelCase", string_fn(camel_case))
    .with("pascalCase", string_fn(pascal_case))
    .with("kebabCase", string_fn(|s| split_words(s).join("-")));

  Object::new()
    .with("__esModule", true)
    .with("default", payload)
    .into()
}

fn mathx() -> Value {
  let stats = Object::new()
    .with(
      "sum",
      Value::function(|args| Ok(Value::from(args.iter().filter_map(Value::as_f64).sum::<f64>()))),
    )
    .with(
      "mean",
      Value::function(|args| {
        let Some(Value::Array(items)) = args.first() else {
          return Err(Exception::new("TypeError: expected an array"));
        };
        if items.is_empty() {
          return Err(Exception::new("RangeError: mean of an empty array"));
        }
        let total: f64 = items.iter().filter_map(Value::as_f64).sum();
        Ok(Value::from(total / items.len() as f64))
      }),
    );

  Object::function(|args| Ok(Value::from(number_arg(args, 0)? * 2.0)))
    .with("triple", Value::function(|args| Ok(Value::from(number_arg(args, 0)? * 3.0))))
    .with(
      "pow",
      Value::function(|args| Ok(Value::from(number_arg(args, 0)?.powf(number_arg(args, 1)?)))),
    )
    .with("stats", stats)
    .with("prototype", Object::new())
    .into()
}

fn mathx_async() -> Value {
  Object::new()
    .with(
      "double",
      Value::function(|args| {
        let x = number_arg(args, 0)?;
        Ok(Value::deferred(async move {
          tokio::task::yield_now().await;
          Ok(Value::from(x * 2.0))
        }))
      }),
    )
    .with(
      "delayedDouble",
      Value::function(|args| {
        let x = number_arg(args, 0)?;
        let millis = number_arg(args, 1).unwrap_or(1.0).clamp(0.0, 60_000.0);
        Ok(Value::deferred(async move {
          tokio::time::sleep(Duration::from_secs_f64(millis / 1_000.0)).await;
          Ok(Value::from(x * 2.0))
        }))
      }),
    )
    .with(
      "fail",
      Value::function(|_| Ok(Value::deferred(async { Err(Exception::new("always rejects")) }))),
    )
    .into()
}
