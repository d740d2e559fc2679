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
use crate::benchmark::Entrant;
use crate::config::Overrides;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Head-to-head benchmarking of callables exported by two packages")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// List the packages the loader can supply.
  Packages,

  /// List the callable exports of a package.
  Explore(ExploreArgs),

  /// Benchmark one export from each of two packages and compare them.
  Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct ExploreArgs {
  /// Package to inspect.
  pub package: String,

  /// How many object levels below the root to descend.
  #[arg(long)]
  pub max_depth: Option<usize>,

  /// Also list the `main`/`default` bookkeeping paths.
  #[arg(long)]
  pub show_meta: bool,

  /// Print the export list as JSON.
  #[arg(long)]
  pub json: bool,

  /// JSON settings file. Defaults to ./duel.json when present.
  #[arg(long, env = "DUEL_CONFIG")]
  pub config: Option<PathBuf>,
}

impl ExploreArgs {
  pub fn overrides(&self) -> Overrides {
    Overrides {
      runs: None,
      max_depth: self.max_depth,
      show_meta: self.show_meta.then_some(true),
    }
  }
}

#[derive(Debug, Args)]
pub struct RunArgs {
  /// First package.
  #[arg(long)]
  pub left: String,

  /// Export path to benchmark in the first package (e.g. `main`, `utils.parse`).
  #[arg(long)]
  pub left_export: String,

  /// Call arguments for the first export.
  /// A JSON array is spread positionally; any other JSON value is passed as
  /// the single argument; plain text is passed as one string.
  /// Example: '[21]' or '{"x": 1}' or 'hello world'
  #[arg(long, default_value = "", allow_hyphen_values = true)]
  pub left_args: String,

  /// Second package.
  #[arg(long)]
  pub right: String,

  /// Export path to benchmark in the second package.
  #[arg(long)]
  pub right_export: String,

  /// Call arguments for the second export, same syntax as --left-args.
  #[arg(long, default_value = "", allow_hyphen_values = true)]
  pub right_args: String,

  /// Runs per side (1-100).
  #[arg(long)]
  pub runs: Option<u32>,

  /// Print the full report as JSON.
  #[arg(long)]
  pub json: bool,

  /// JSON settings file. Defaults to ./duel.json when present.
  #[arg(long, env = "DUEL_CONFIG")]
  pub config: Option<PathBuf>,
}

impl RunArgs {
  pub fn overrides(&self) -> Overrides {
    Overrides {
      runs: self.runs,
      ..Overrides::default()
    }
  }

  pub fn entrants(&self) -> (Entrant, Entrant) {
    (
      Entrant {
        package: self.left.clone(),
        export: self.left_export.clone(),
        raw_args: self.left_args.clone(),
      },
      Entrant {
        package: self.right.clone(),
        export: self.right_export.clone(),
        raw_args: self.right_args.clone(),
      },
    )
  }
}
