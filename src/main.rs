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
use Commands::Explore;
use Commands::Packages;
use Commands::Run;
use anyhow::Result;
use clap::Parser;
use duelab::benchmark::explore_package;
use duelab::benchmark::run_duel;
use duelab::cli::Cli;
use duelab::cli::Commands;
use duelab::config::Settings;
use duelab::heap::AllocatorProbe;
use duelab::heap::TrackingAllocator;
use duelab::loader::Registry;
use duelab::logging::setup_tracing;
use tracing::Instrument;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let _log_guard = setup_tracing()?;

  let Cli { command } = Cli::parse();
  let registry = Registry::builtin();

  async move {
    match command {
      Packages => {
        for package in registry.packages() {
          println!("{package}");
        }
      }
      Explore(explore_args) => {
        let settings = Settings::load(explore_args.config.as_deref(), &explore_args.overrides())?;
        let entries = explore_package(&settings, &explore_args.package, &registry).await?;

        if explore_args.json {
          println!("{}", serde_json::to_string_pretty(&entries)?);
        } else if entries.is_empty() {
          tracing::warn!(package = %explore_args.package, "No callable exports found");
        } else {
          for entry in &entries {
            println!("{}", entry.path);
          }
        }
      }
      Run(run_args) => {
        tracing::info!("Initializing Duel...");

        let settings = Settings::load(run_args.config.as_deref(), &run_args.overrides())?;
        let (left, right) = run_args.entrants();
        let report = run_duel(&settings, &left, &right, &registry, &AllocatorProbe).await?;

        if run_args.json {
          println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
          print!("{report}");
        }
      }
    }
    Ok::<(), anyhow::Error>(())
  }
  .instrument(tracing::info_span!("duel"))
  .await
}
