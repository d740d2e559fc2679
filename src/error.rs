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
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the duelab library.
#[derive(Error, Debug)]
pub enum DuelError {
  #[error(transparent)]
  Argument(#[from] ArgumentError),

  #[error(transparent)]
  Discovery(#[from] DiscoveryError),

  #[error(transparent)]
  Load(#[from] LoadError),

  #[error("Benchmark session failed")]
  Session(#[from] SessionError),
}

/// Errors related to settings resolution (src/config.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to load settings")]
  Extract(#[from] Box<figment::Error>),

  #[error("Config file not found: {0}")]
  ConfigFileNotFound(PathBuf),

  #[error("Run count must be between {min} and {max}, got {runs}")]
  RunCountOutOfRange { runs: u32, min: u32, max: u32 },
}

/// Errors raised while turning raw argument text into call arguments (src/args.rs).
#[derive(Error, Debug)]
pub enum ArgumentError {
  #[error("Malformed structured argument '{input}': {source}")]
  MalformedStructured {
    input: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Errors raised while enumerating a module's exports (src/explore.rs).
#[derive(Error, Debug)]
pub enum DiscoveryError {
  #[error("Export discovery failed: {message}")]
  EnumerationFailed { message: String },
}

/// Errors raised when an export path does not lead to something invocable (src/resolve.rs).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
  #[error("Export path not found: '{path}'")]
  NotFound { path: String },

  #[error("Export path '{path}' is not callable (found {kind})")]
  NotCallable { path: String, kind: &'static str },
}

/// Errors surfaced by a module loader (src/loader.rs).
#[derive(Error, Debug, Clone)]
pub enum LoadError {
  #[error("Failed to load module '{package}': {cause}")]
  ModuleLoadFailed { package: String, cause: String },
}

/// Errors fatal to a whole benchmark session (src/benchmark.rs).
#[derive(Error, Debug)]
pub enum SessionError {
  #[error("Both modules failed to load:\n  {left}\n  {right}")]
  BothModulesFailed { left: LoadError, right: LoadError },
}
