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
use crate::error::LoadError;
use crate::packages;
use crate::value::Value;
use std::collections::BTreeMap;
use std::future::Future;

/// Supplies loaded modules by package identifier.
///
/// Installation, format detection and entry-point resolution are the
/// loader's business; the engine only ever sees the resulting [`Value`].
pub trait ModuleLoader {
  fn load(&self, package: &str) -> impl Future<Output = Result<Value, LoadError>> + Send;
}

/// Builds a fresh module instance.
pub type ModuleFactory = fn() -> Value;

/// In-memory loader keyed by package identifier.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  packages: BTreeMap<String, ModuleFactory>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry holding the bundled demo packages.
  pub fn builtin() -> Self {
    let mut registry = Self::new();
    for (name, factory) in packages::BUILTIN {
      registry.register(*name, *factory);
    }
    registry
  }

  pub fn register(&mut self, package: impl Into<String>, factory: ModuleFactory) -> &mut Self {
    self.packages.insert(package.into(), factory);
    self
  }

  /// Registered identifiers, sorted.
  pub fn packages(&self) -> impl Iterator<Item = &str> {
    self.packages.keys().map(String::as_str)
  }
}

impl ModuleLoader for Registry {
  async fn load(&self, package: &str) -> Result<Value, LoadError> {
    let Some(factory) = self.packages.get(package) else {
      let available: Vec<&str> = self.packages().collect();
      return Err(LoadError::ModuleLoadFailed {
        package: package.to_string(),
        cause: format!("unknown package. Available: {available:?}"),
      });
    };
    tracing::debug!(%package, "Loaded module from registry");
    Ok(factory())
  }
}
