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

//! Timed, memory-probed invocation of a single callable.
//!
//! Runs are strictly sequential and the first failure ends the series. There
//! is no isolation: the callable runs with full access to the process, and a
//! callable that never returns (or a thenable that never settles) blocks the
//! profiler indefinitely.
use crate::config::RunCount;
use crate::heap::HeapProbe;
use crate::value::Exception;
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::Instrument;

/// One invocation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeasurement {
  pub elapsed_ms: f64,
  pub memory_delta_bytes: i64,
  /// JSON form of the settled result; absent for failures and non-JSON values.
  pub value: Option<serde_json::Value>,
  pub failed: bool,
  pub error_message: Option<String>,
}

/// Aggregate of a run series for one callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkOutcome {
  pub path: String,
  pub runs_requested: u32,
  pub measurements: Vec<RunMeasurement>,
  /// Mean over completed runs; `None` when no run completed.
  pub average_time_ms: Option<f64>,
  /// Mean over completed runs; `None` when no run completed.
  pub average_memory_bytes: Option<f64>,
  pub last_value: Option<serde_json::Value>,
  pub last_error_message: Option<String>,
}

impl BenchmarkOutcome {
  /// An outcome for a callable that never got to run.
  pub fn failed(path: &str, message: impl Into<String>) -> Self {
    Self {
      path: path.to_string(),
      runs_requested: 0,
      measurements: Vec::new(),
      average_time_ms: None,
      average_memory_bytes: None,
      last_value: None,
      last_error_message: Some(message.into()),
    }
  }

  pub fn is_error_free(&self) -> bool {
    self.last_error_message.is_none()
  }

  pub fn completed_runs(&self) -> usize {
    self.measurements.iter().filter(|m| !m.failed).count()
  }
}

/// Invokes `callable` with `args` up to `runs` times and aggregates the series.
///
/// Each run snapshots the heap, then the clock, invokes, settles any
/// thenable result, then snapshots the clock and the heap again. A throw or
/// rejection is recorded as a failed run and no further runs are attempted.
pub async fn profile(
  path: &str,
  callable: &Value,
  args: &[Value],
  runs: RunCount,
  probe: &dyn HeapProbe,
) -> BenchmarkOutcome {
  let span = tracing::info_span!("profile", %path, runs = runs.get());

  async {
    let mut measurements = Vec::with_capacity(runs.get() as usize);

    for run in 1..=runs.get() {
      let mem_before = probe.heap_used();
      let start = Instant::now();
      let settled = match callable.call(args) {
        Ok(returned) => settle(returned).await,
        Err(e) => Err(e),
      };
      let elapsed = start.elapsed();
      let mem_after = probe.heap_used();

      let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
      let memory_delta_bytes = mem_after.wrapping_sub(mem_before) as i64;

      match settled {
        Ok(value) => {
          tracing::debug!(run, elapsed_ms, memory_delta_bytes, "Run complete");
          measurements.push(RunMeasurement {
            elapsed_ms,
            memory_delta_bytes,
            value: value.to_json(),
            failed: false,
            error_message: None,
          });
        }
        Err(e) => {
          tracing::warn!(run, error = %e, "Invocation failed; stopping run series");
          measurements.push(RunMeasurement {
            elapsed_ms,
            memory_delta_bytes,
            value: None,
            failed: true,
            error_message: Some(e.message().to_string()),
          });
          break;
        }
      }
    }

    summarize(path, runs, measurements)
  }
  .instrument(span)
  .await
}

fn summarize(path: &str, runs: RunCount, measurements: Vec<RunMeasurement>) -> BenchmarkOutcome {
  let completed: Vec<&RunMeasurement> = measurements.iter().filter(|m| !m.failed).collect();
  let average_time_ms = mean(completed.iter().map(|m| m.elapsed_ms));
  let average_memory_bytes = mean(completed.iter().map(|m| m.memory_delta_bytes as f64));

  let (last_value, last_error_message) = match measurements.last() {
    Some(last) => (last.value.clone(), last.error_message.clone()),
    None => (None, None),
  };

  BenchmarkOutcome {
    path: path.to_string(),
    runs_requested: runs.get(),
    measurements,
    average_time_ms,
    average_memory_bytes,
    last_value,
    last_error_message,
  }
}

fn mean(samples: impl Iterator<Item = f64>) -> Option<f64> {
  let (sum, count) = samples.fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
  (count > 0).then(|| sum / count as f64)
}

/// Settles `value` if it is a thenable, repeatedly, until a plain value remains.
///
/// Any object with a callable `then` member counts. `then` receives a
/// `resolve` and a `reject` callback; the first one invoked wins. A `then`
/// that throws before settling rejects, and one that drops both callbacks
/// without calling either is reported as a failure.
pub async fn settle(mut value: Value) -> Result<Value, Exception> {
  loop {
    let then = match value.as_object() {
      Some(obj) => obj.get("then")?,
      None => return Ok(value),
    };
    if !then.is_callable() {
      return Ok(value);
    }
    value = await_thenable(&then).await?;
  }
}

type SettleSlot = Arc<Mutex<Option<oneshot::Sender<Result<Value, Exception>>>>>;

async fn await_thenable(then: &Value) -> Result<Value, Exception> {
  let (tx, rx) = oneshot::channel();
  let slot: SettleSlot = Arc::new(Mutex::new(Some(tx)));

  let resolve = settle_callback(slot.clone(), |args| Ok(args.first().cloned().unwrap_or_default()));
  let reject = settle_callback(slot.clone(), |args| {
    Err(Exception::from_value(&args.first().cloned().unwrap_or_default()))
  });

  if let Err(e) = then.call(&[resolve, reject]) {
    send_once(&slot, Err(e));
  }
  // Only the callbacks may keep the sender alive from here on.
  drop(slot);

  rx.await
    .unwrap_or_else(|_| Err(Exception::new("thenable was dropped without settling")))
}

fn settle_callback(slot: SettleSlot, outcome: fn(&[Value]) -> Result<Value, Exception>) -> Value {
  Value::function(move |args| {
    send_once(&slot, outcome(args));
    Ok(Value::Undefined)
  })
}

fn send_once(slot: &SettleSlot, result: Result<Value, Exception>) {
  if let Some(tx) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
    // The receiver only goes away if the profiler itself was dropped.
    let _ = tx.send(result);
  }
}
