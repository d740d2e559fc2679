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
use crate::error::ConfigError;
use crate::explore::DEFAULT_MAX_DEPTH;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Serialized;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

pub const MIN_RUNS: u32 = 1;
pub const MAX_RUNS: u32 = 100;
pub const DEFAULT_RUNS: u32 = 10;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "duel.json";

/// Prefix of the environment variables that override settings (e.g. `DUEL_RUNS=5`).
pub const ENV_PREFIX: &str = "DUEL_";

/// Number of runs per side, always within `MIN_RUNS..=MAX_RUNS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunCount(u32);

impl RunCount {
  pub fn get(self) -> u32 {
    self.0
  }
}

impl TryFrom<u32> for RunCount {
  type Error = ConfigError;

  fn try_from(runs: u32) -> Result<Self, Self::Error> {
    if (MIN_RUNS..=MAX_RUNS).contains(&runs) {
      Ok(Self(runs))
    } else {
      Err(ConfigError::RunCountOutOfRange {
        runs,
        min: MIN_RUNS,
        max: MAX_RUNS,
      })
    }
  }
}

/// Settings as layered together, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawSettings {
  runs: u32,
  max_depth: usize,
  show_meta: bool,
}

impl Default for RawSettings {
  fn default() -> Self {
    Self {
      runs: DEFAULT_RUNS,
      max_depth: DEFAULT_MAX_DEPTH,
      show_meta: false,
    }
  }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub runs: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_depth: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub show_meta: Option<bool>,
}

/// Fully validated settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
  pub runs: RunCount,
  pub max_depth: usize,
  pub show_meta: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      runs: RunCount(DEFAULT_RUNS),
      max_depth: DEFAULT_MAX_DEPTH,
      show_meta: false,
    }
  }
}

impl Settings {
  /// Layers defaults, the JSON config file, `DUEL_*` environment variables and
  /// CLI overrides, in that order, then validates the result.
  ///
  /// An explicitly named config file must exist; the default one is optional.
  pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
    let file = match config_file {
      Some(path) if !path.exists() => {
        return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
      }
      Some(path) => Json::file(path),
      None => Json::file(DEFAULT_CONFIG_FILE),
    };

    let raw: RawSettings = Figment::from(Serialized::defaults(RawSettings::default()))
      .merge(file)
      .merge(Env::prefixed(ENV_PREFIX))
      .merge(Serialized::defaults(overrides))
      .extract()
      .map_err(Box::new)?;

    tracing::debug!(?raw, "Resolved settings");
    raw.validate()
  }
}

impl RawSettings {
  fn validate(self) -> Result<Settings, ConfigError> {
    Ok(Settings {
      runs: RunCount::try_from(self.runs)?,
      max_depth: self.max_depth,
      show_meta: self.show_meta,
    })
  }
}
