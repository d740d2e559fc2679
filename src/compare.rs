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
use crate::profile::BenchmarkOutcome;
use serde::Serialize;

/// A labelled outcome, one per compared module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contender {
  pub label: String,
  pub outcome: BenchmarkOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  Left,
  Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
  /// The faster of two error-free outcomes.
  Winner {
    side: Side,
    label: String,
    /// Loser's average time over the winner's, to two decimals. `None` when
    /// the winner averaged zero.
    ratio: Option<f64>,
  },
  /// At least one side failed; lists which.
  NoWinner { failed: Vec<Side> },
}

/// Both sides succeeded but settled on different values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
  pub left: Option<serde_json::Value>,
  pub right: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
  pub verdict: Verdict,
  pub divergence: Option<Divergence>,
}

/// Compares two outcomes.
///
/// The winner has the lower average time; on an exact tie the left side
/// wins. A result mismatch is flagged alongside the winner, never instead of it.
pub fn compare(left: &Contender, right: &Contender) -> Comparison {
  let timings = match (
    left.outcome.is_error_free(),
    right.outcome.is_error_free(),
    left.outcome.average_time_ms,
    right.outcome.average_time_ms,
  ) {
    (true, true, Some(left_ms), Some(right_ms)) => Some((left_ms, right_ms)),
    _ => None,
  };

  let Some((left_ms, right_ms)) = timings else {
    let failed = [(Side::Left, left), (Side::Right, right)]
      .into_iter()
      .filter(|(_, contender)| !contender.outcome.is_error_free() || contender.outcome.average_time_ms.is_none())
      .map(|(side, _)| side)
      .collect();
    return Comparison {
      verdict: Verdict::NoWinner { failed },
      divergence: None,
    };
  };

  let (side, winner, winner_ms, loser_ms) = if right_ms < left_ms {
    (Side::Right, right, right_ms, left_ms)
  } else {
    (Side::Left, left, left_ms, right_ms)
  };
  let ratio = (winner_ms > 0.0).then(|| round2(loser_ms / winner_ms));

  let divergence = (left.outcome.last_value != right.outcome.last_value).then(|| Divergence {
    left: left.outcome.last_value.clone(),
    right: right.outcome.last_value.clone(),
  });
  if divergence.is_some() {
    tracing::warn!(left = %left.label, right = %right.label, "Results differ between contenders");
  }

  Comparison {
    verdict: Verdict::Winner {
      side,
      label: winner.label.clone(),
      ratio,
    },
    divergence,
  }
}

fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}
