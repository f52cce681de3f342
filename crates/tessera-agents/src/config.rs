// Copyright 2025 eraflo
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

//! Project-level configuration, read from TOML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tessera_core::id::LibraryKind;

/// Base name of the scene-dependency library chain when none is configured.
pub const DEFAULT_SCENE_DEPS_LIBRARY: &str = "SceneDeps";

/// Names of the libraries a project can load.
///
/// ```toml
/// asset_libraries = ["BuiltIn", "Terrain"]
/// scene_deps_library = "SceneDeps"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Static libraries; the library at position `n` owns static ordinal `n`.
    pub asset_libraries: Vec<String>,
    /// Base name of the scene-dependency chain. The first library uses the
    /// name as is, the n-th one (n >= 2) appends `n`.
    pub scene_deps_library: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            asset_libraries: Vec::new(),
            scene_deps_library: DEFAULT_SCENE_DEPS_LIBRARY.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Parses a configuration from TOML text. Missing keys take their
    /// default value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse project configuration")
    }

    /// Reads the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project configuration at '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))
    }

    /// Name of the static library at `ordinal`.
    pub fn static_library(&self, ordinal: u32) -> Option<&str> {
        if !LibraryKind::Static.bounds().contains(ordinal) {
            return None;
        }
        self.asset_libraries
            .get(ordinal as usize)
            .map(String::as_str)
    }

    /// Ordinal of the static library called `name`.
    pub fn static_ordinal(&self, name: &str) -> Option<u32> {
        let bounds = LibraryKind::Static.bounds();
        self.asset_libraries
            .iter()
            .position(|library| library == name)
            .and_then(|position| u32::try_from(position).ok())
            .filter(|ordinal| bounds.contains(*ordinal))
    }

    /// Name of the scene-dependency library at `ordinal`.
    pub fn scene_library(&self, ordinal: u32) -> Option<String> {
        let bounds = LibraryKind::Scene.bounds();
        if !bounds.contains(ordinal) {
            return None;
        }
        match ordinal - bounds.first_ordinal {
            0 => Some(self.scene_deps_library.clone()),
            n => Some(format!("{}{}", self.scene_deps_library, n + 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = ProjectConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.scene_deps_library, DEFAULT_SCENE_DEPS_LIBRARY);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "asset_libraries = [\"BuiltIn\", \"Terrain\"]").expect("write");
        writeln!(file, "scene_deps_library = \"LevelDeps\"").expect("write");

        let config = ProjectConfig::load(file.path()).expect("config loads");
        assert_eq!(config.static_library(1), Some("Terrain"));
        assert_eq!(config.static_ordinal("BuiltIn"), Some(0));
        assert_eq!(config.static_ordinal("Missing"), None);
        assert_eq!(config.scene_deps_library, "LevelDeps");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("Project.toml");
        let error = ProjectConfig::load(&path).expect_err("file is missing");
        assert!(format!("{error:#}").contains("Project.toml"));
    }

    #[test]
    fn test_scene_library_chain_names() {
        let config = ProjectConfig::default();
        let first = LibraryKind::Scene.bounds().first_ordinal;
        assert_eq!(config.scene_library(first).as_deref(), Some("SceneDeps"));
        assert_eq!(config.scene_library(first + 1).as_deref(), Some("SceneDeps2"));
        assert_eq!(config.scene_library(first + 2).as_deref(), Some("SceneDeps3"));
        assert_eq!(config.scene_library(0), None);
    }
}
