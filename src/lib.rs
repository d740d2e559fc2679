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

//! # Duelab
//!
//! `duelab` pits one callable from each of two packages against each other
//! and reports latency, heap delta and return value side by side, declaring a
//! winner when both sides ran cleanly.
//!
//! Packages arrive as dynamically-shaped value graphs with no schema. The
//! engine discovers what they export, resolves a chosen path back to a live
//! callable, invokes it under measurement, and compares the two outcomes.
//!
//! ## Core Modules
//!
//! * [`value`]: The dynamic value graph (objects, callables, thenables).
//! * [`args`]: Turns raw argument text into positional call arguments.
//! * [`explore`]: Enumerates callable export paths without invoking anything.
//! * [`resolve`]: Maps an export path back to a callable.
//! * [`profile`]: Times and memory-probes a run series of one callable.
//! * [`compare`]: Picks a winner and flags diverging results.
//! * [`benchmark`]: Orchestrates a full duel between two packages.
//! * [`loader`]: The `ModuleLoader` seam and the in-memory `Registry`.
//! * [`packages`]: Demo packages bundled with the `duel` binary.
//! * [`heap`]: Heap usage probes, including the counting global allocator.
//! * [`report`]: Plain-text rendering and host facts.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`config`]: Layered settings (defaults, `duel.json`, `DUEL_*`, flags).
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod args;
pub mod benchmark;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod explore;
pub mod heap;
pub mod loader;
pub mod logging;
pub mod packages;
pub mod profile;
pub mod report;
pub mod resolve;
pub mod value;
