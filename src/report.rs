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
use crate::benchmark::DuelReport;
use crate::compare::Contender;
use crate::compare::Side;
use crate::compare::Verdict;
use serde::Serialize;
use std::env;
use std::fmt;
use std::fs;

/// Facts about the host, reported next to the numbers.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
  pub os: String,
  pub arch: String,
  pub cpu_model: Option<String>,
  pub cpu_cores: usize,
  pub total_memory_bytes: Option<u64>,
  pub duel_version: String,
}

impl SystemInfo {
  pub fn detect() -> Self {
    SystemInfo {
      os: env::consts::OS.to_string(),
      arch: env::consts::ARCH.to_string(),
      cpu_model: detect_cpu_model(),
      cpu_cores: std::thread::available_parallelism().map_or(1, |n| n.get()),
      total_memory_bytes: detect_total_memory(),
      duel_version: env!("CARGO_PKG_VERSION").to_string(),
    }
  }
}

fn detect_cpu_model() -> Option<String> {
  let cpuinfo = fs::read_to_string("/proc/cpuinfo").ok()?;
  cpuinfo
    .lines()
    .find(|line| line.starts_with("model name"))
    .and_then(|line| line.split_once(':'))
    .map(|(_, model)| model.trim().to_string())
}

fn detect_total_memory() -> Option<u64> {
  let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
  let line = meminfo.lines().find(|line| line.starts_with("MemTotal:"))?;
  let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
  Some(kib * 1024)
}

fn value_text(value: Option<&serde_json::Value>) -> String {
  value.map_or_else(|| "undefined".to_string(), |v| v.to_string())
}

fn write_contender(f: &mut fmt::Formatter<'_>, contender: &Contender) -> fmt::Result {
  let outcome = &contender.outcome;
  writeln!(f, "{} :: {}", contender.label, outcome.path)?;

  match (outcome.average_time_ms, outcome.average_memory_bytes) {
    (Some(time), Some(memory)) => {
      writeln!(
        f,
        "  avg time    {time:.4} ms ({} of {} runs)",
        outcome.completed_runs(),
        outcome.runs_requested
      )?;
      writeln!(f, "  avg memory  {memory:+.0} B")?;
    }
    _ => writeln!(f, "  avg time    n/a (no completed runs)")?,
  }

  match &outcome.last_error_message {
    Some(error) => writeln!(f, "  error       {error}"),
    None => writeln!(f, "  result      {}", value_text(outcome.last_value.as_ref())),
  }
}

impl fmt::Display for DuelReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_contender(f, &self.left)?;
    writeln!(f)?;
    write_contender(f, &self.right)?;
    writeln!(f)?;

    match &self.comparison.verdict {
      Verdict::Winner {
        label,
        ratio: Some(ratio),
        ..
      } => writeln!(f, "Winner: {label} ({ratio:.2}x faster)")?,
      Verdict::Winner { label, .. } => writeln!(f, "Winner: {label}")?,
      Verdict::NoWinner { failed } => {
        let sides: Vec<&str> = failed
          .iter()
          .map(|side| match side {
            Side::Left => self.left.label.as_str(),
            Side::Right => self.right.label.as_str(),
          })
          .collect();
        writeln!(f, "No winner: {} failed", sides.join(" and "))?;
      }
    }

    if let Some(divergence) = &self.comparison.divergence {
      writeln!(
        f,
        "Warning: results differ ({} vs {}); the faster one may not be correct",
        value_text(divergence.left.as_ref()),
        value_text(divergence.right.as_ref())
      )?;
    }

    let system = &self.system;
    write!(f, "System: {} {}, {} cores", system.os, system.arch, system.cpu_cores)?;
    if let Some(model) = &system.cpu_model {
      write!(f, ", {model}")?;
    }
    if let Some(bytes) = system.total_memory_bytes {
      write!(f, ", {:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))?;
    }
    writeln!(f, ", duel {}", system.duel_version)
  }
}
