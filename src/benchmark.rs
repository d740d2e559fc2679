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
use crate::args::parse_arguments;
use crate::compare::Comparison;
use crate::compare::Contender;
use crate::compare::compare;
use crate::config::RunCount;
use crate::config::Settings;
use crate::error::DuelError;
use crate::error::LoadError;
use crate::error::SessionError;
use crate::explore::ExportEntry;
use crate::explore::Explorer;
use crate::heap::HeapProbe;
use crate::loader::ModuleLoader;
use crate::profile::BenchmarkOutcome;
use crate::profile::profile;
use crate::report::SystemInfo;
use crate::resolve::resolve_callable;
use crate::value::Value;
use serde::Serialize;
use tracing::Instrument;

/// One side of a duel: which package, which export, and the raw argument text.
#[derive(Debug, Clone)]
pub struct Entrant {
  pub package: String,
  pub export: String,
  pub raw_args: String,
}

/// Everything a duel produced, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct DuelReport {
  pub system: SystemInfo,
  pub left: Contender,
  pub right: Contender,
  pub comparison: Comparison,
}

/// Loads one package and lists its callable exports.
pub async fn explore_package<L: ModuleLoader>(
  settings: &Settings,
  package: &str,
  loader: &L,
) -> Result<Vec<ExportEntry>, DuelError> {
  let span = tracing::info_span!("explore", %package, max_depth = settings.max_depth);

  async {
    let module = loader.load(package).await?;
    let entries = Explorer::new(settings.max_depth)
      .include_meta(settings.show_meta)
      .explore(&module)?;
    tracing::info!(count = entries.len(), "Discovered callable exports");
    Ok::<_, DuelError>(entries)
  }
  .instrument(span)
  .await
}

/// Runs the full duel: parse arguments, load both modules, then benchmark the
/// left side to completion before the right side starts.
///
/// Malformed argument text and a failure to load both modules are fatal.
/// Anything that goes wrong on only one side is recorded in that side's
/// outcome and the duel still completes.
pub async fn run_duel<L: ModuleLoader>(
  settings: &Settings,
  left: &Entrant,
  right: &Entrant,
  loader: &L,
  probe: &dyn HeapProbe,
) -> Result<DuelReport, DuelError> {
  let span = tracing::info_span!(
    "run_duel",
    left = %left.package,
    right = %right.package,
    runs = settings.runs.get()
  );

  async {
    tracing::info!("--- Starting Duel ---");
    let left_args = parse_arguments(&left.raw_args)?;
    let right_args = parse_arguments(&right.raw_args)?;

    let loaded = (
      loader.load(&left.package).await,
      loader.load(&right.package).await,
    );
    let (left_module, right_module) = match loaded {
      (Err(left), Err(right)) => return Err(DuelError::from(SessionError::BothModulesFailed { left, right })),
      loaded => loaded,
    };

    let left = run_side(left, left_module, &left_args, settings.runs, probe)
      .instrument(tracing::info_span!("side", side = "left"))
      .await;
    let right = run_side(right, right_module, &right_args, settings.runs, probe)
      .instrument(tracing::info_span!("side", side = "right"))
      .await;

    let comparison = compare(&left, &right);
    tracing::info!("--- Duel complete ---");

    Ok::<_, DuelError>(DuelReport {
      system: SystemInfo::detect(),
      left,
      right,
      comparison,
    })
  }
  .instrument(span)
  .await
}

async fn run_side(
  entrant: &Entrant,
  module: Result<Value, LoadError>,
  args: &[Value],
  runs: RunCount,
  probe: &dyn HeapProbe,
) -> Contender {
  let outcome = match module {
    Err(e) => {
      tracing::error!(error = %e, "Module failed to load");
      BenchmarkOutcome::failed(&entrant.export, e.to_string())
    }
    Ok(module) => match resolve_callable(&module, &entrant.export) {
      Err(e) => {
        tracing::error!(error = %e, "Export could not be resolved");
        BenchmarkOutcome::failed(&entrant.export, e.to_string())
      }
      Ok(callable) => {
        tracing::info!(package = %entrant.package, export = %entrant.export, "Benchmarking...");
        profile(&entrant.export, &callable, args, runs, probe).await
      }
    },
  };

  Contender {
    label: entrant.package.clone(),
    outcome,
  }
}
