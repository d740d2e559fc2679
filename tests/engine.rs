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
use duelab::benchmark::Entrant;
use duelab::benchmark::explore_package;
use duelab::benchmark::run_duel;
use duelab::compare::Side;
use duelab::compare::Verdict;
use duelab::config::RunCount;
use duelab::config::Settings;
use duelab::error::DiscoveryError;
use duelab::error::DuelError;
use duelab::error::LoadError;
use duelab::error::SessionError;
use duelab::heap::AllocatorProbe;
use duelab::loader::Registry;
use duelab::value::Exception;
use duelab::value::Object;
use duelab::value::Value;
use serde_json::json;

fn settings(runs: u32) -> Settings {
  Settings {
    runs: RunCount::try_from(runs).unwrap(),
    ..Settings::default()
  }
}

fn entrant(package: &str, export: &str, raw_args: &str) -> Entrant {
  Entrant {
    package: package.to_string(),
    export: export.to_string(),
    raw_args: raw_args.to_string(),
  }
}

fn double(args: &[Value]) -> Result<Value, duelab::value::Exception> {
  Ok(Value::from(args[0].as_f64().unwrap_or(0.0) * 2.0))
}

fn flat_doubler() -> Value {
  Object::new().with("double", Value::function(double)).into()
}

fn nested_doubler() -> Value {
  let math = Object::new().with("double", Value::function(double));
  Object::new()
    .with("default", Object::new().with("math", math).with("VERSION", "1.0.0"))
    .into()
}

fn hello_pascal() -> Value {
  Object::new()
    .with("greet", Value::function(|_| Ok(Value::from("HelloWorld"))))
    .into()
}

fn hello_spaced() -> Value {
  Object::new()
    .with("greet", Value::function(|_| Ok(Value::from("Hello world"))))
    .into()
}

fn sealed() -> Value {
  Object::with_keys_trap(|| Err(Exception::new("sealed module"))).into()
}

fn test_registry() -> Registry {
  let mut registry = Registry::builtin();
  registry
    .register("flat-doubler", flat_doubler)
    .register("nested-doubler", nested_doubler)
    .register("hello-pascal", hello_pascal)
    .register("hello-spaced", hello_spaced)
    .register("sealed", sealed);
  registry
}

#[tokio::test]
async fn test_equivalent_modules_pick_winner_by_time() {
  let report = run_duel(
    &settings(1),
    &entrant("flat-doubler", "double", "[21]"),
    &entrant("nested-doubler", "math.double", "[21]"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert_eq!(report.left.outcome.last_value, Some(json!(42)));
  assert_eq!(report.right.outcome.last_value, Some(json!(42)));
  assert_eq!(report.comparison.divergence, None);

  let left_ms = report.left.outcome.average_time_ms.unwrap();
  let right_ms = report.right.outcome.average_time_ms.unwrap();
  let expected = if right_ms < left_ms { Side::Right } else { Side::Left };
  assert!(matches!(report.comparison.verdict, Verdict::Winner { side, .. } if side == expected));
}

#[tokio::test]
async fn test_divergent_results_are_flagged() {
  let report = run_duel(
    &settings(3),
    &entrant("hello-pascal", "greet", ""),
    &entrant("hello-spaced", "greet", ""),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert!(matches!(report.comparison.verdict, Verdict::Winner { .. }));
  let divergence = report.comparison.divergence.unwrap();
  assert_eq!(divergence.left, Some(json!("HelloWorld")));
  assert_eq!(divergence.right, Some(json!("Hello world")));
}

#[tokio::test]
async fn test_bad_path_degrades_one_side() {
  let report = run_duel(
    &settings(2),
    &entrant("mathx", "stats.median", "[1]"),
    &entrant("mathx", "main", "21"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert_eq!(
    report.left.outcome.last_error_message.as_deref(),
    Some("Export path not found: 'stats.median'")
  );
  assert_eq!(report.right.outcome.completed_runs(), 2);
  assert_eq!(report.right.outcome.last_value, Some(json!(42)));
  assert_eq!(report.comparison.verdict, Verdict::NoWinner { failed: vec![Side::Left] });
}

#[tokio::test]
async fn test_non_callable_path_is_reported() {
  let report = run_duel(
    &settings(1),
    &entrant("case-kit", "VERSION", ""),
    &entrant("case-kit", "camelCase", "hello world"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert_eq!(
    report.left.outcome.last_error_message.as_deref(),
    Some("Export path 'VERSION' is not callable (found string)")
  );
  assert_eq!(report.right.outcome.last_value, Some(json!("helloWorld")));
}

#[tokio::test]
async fn test_invocation_failure_keeps_other_side() {
  let report = run_duel(
    &settings(5),
    &entrant("mathx-async", "fail", ""),
    &entrant("mathx-async", "double", "[4]"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert_eq!(report.left.outcome.measurements.len(), 1);
  assert_eq!(report.left.outcome.last_error_message.as_deref(), Some("always rejects"));
  assert_eq!(report.right.outcome.completed_runs(), 5);
  assert_eq!(report.right.outcome.last_value, Some(json!(8)));
}

#[tokio::test]
async fn test_one_load_failure_is_not_fatal() {
  let report = run_duel(
    &settings(1),
    &entrant("does-not-exist", "main", ""),
    &entrant("mathx", "triple", "[2]"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  let error = report.left.outcome.last_error_message.unwrap();
  assert!(error.starts_with("Failed to load module 'does-not-exist'"));
  assert_eq!(report.right.outcome.last_value, Some(json!(6)));
}

#[tokio::test]
async fn test_both_load_failures_are_fatal() {
  let err = run_duel(
    &settings(1),
    &entrant("nope-a", "main", ""),
    &entrant("nope-b", "main", ""),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap_err();

  assert!(matches!(err, DuelError::Session(SessionError::BothModulesFailed { .. })));
}

#[tokio::test]
async fn test_malformed_arguments_are_fatal() {
  let err = run_duel(
    &settings(1),
    &entrant("mathx", "main", "[1,2,"),
    &entrant("mathx", "triple", "[1]"),
    &test_registry(),
    &AllocatorProbe,
  )
  .await
  .unwrap_err();

  assert!(matches!(err, DuelError::Argument(_)));
}

#[tokio::test]
async fn test_explore_builtin_shapes() {
  let registry = Registry::builtin();
  let paths = |entries: Vec<duelab::explore::ExportEntry>| -> Vec<String> {
    entries.into_iter().map(|entry| entry.path).collect()
  };

  let kit = explore_package(&settings(1), "case-kit", &registry).await.unwrap();
  assert_eq!(
    paths(kit),
    vec![
      "camelCase",
      "kebabCase",
      "snakeCase",
      "words",
      "strings.capitalize",
      "strings.reverse"
    ]
  );

  let lite = explore_package(&settings(1), "case-kit-lite", &registry).await.unwrap();
  assert_eq!(paths(lite), vec!["camelCase", "pascalCase", "kebabCase"]);

  let mathx = explore_package(&settings(1), "mathx", &registry).await.unwrap();
  assert_eq!(paths(mathx), vec!["triple", "pow", "stats.sum", "stats.mean"]);

  let with_meta = Settings {
    show_meta: true,
    ..settings(1)
  };
  let mathx = explore_package(&with_meta, "mathx", &registry).await.unwrap();
  assert_eq!(paths(mathx)[0], "main");
}

#[tokio::test]
async fn test_interop_paths_resolve_through_default() {
  let report = run_duel(
    &settings(1),
    &entrant("case-kit-lite", "pascalCase", "hello world"),
    &entrant("case-kit", "camelCase", "hello world"),
    &Registry::builtin(),
    &AllocatorProbe,
  )
  .await
  .unwrap();

  assert_eq!(report.left.outcome.last_value, Some(json!("HelloWorld")));
  assert!(report.comparison.divergence.is_some());
}

#[tokio::test]
async fn test_explore_surfaces_load_and_discovery_errors() {
  let registry = test_registry();

  let err = explore_package(&settings(1), "left-pad", &registry).await.unwrap_err();
  assert!(matches!(err, DuelError::Load(LoadError::ModuleLoadFailed { ref package, .. }) if package == "left-pad"));

  let err = explore_package(&settings(1), "sealed", &registry).await.unwrap_err();
  assert!(matches!(
    err,
    DuelError::Discovery(DiscoveryError::EnumerationFailed { ref message }) if message == "sealed module"
  ));
}
