//! Project configuration.
//!
//! Loaded from `archlens.yaml` (or `.archlens.yaml`) at the project root.
//! Every field is optional.
//!
//! ```yaml
//! cache_dir: .archlens
//! stereotypes: [Component, Repository, Service]
//! excluded_paths: ["**/generated/**"]
//! entry_points:
//!   class_name_patterns: ["*Application", "Main"]
//!   annotations: [SpringBootApplication]
//!   roots_are_entry_points: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::FsBlobStore;
use crate::di::DEFAULT_STEREOTYPES;

/// File names tried by [`Config::discover`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["archlens.yaml", ".archlens.yaml"];

pub const DEFAULT_CACHE_DIR: &str = ".archlens";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding identifier cache entries, relative to the project root.
    pub cache_dir: PathBuf,
    /// Annotations that mark a class as a DI-managed implementation.
    pub stereotypes: Vec<String>,
    /// Glob patterns for paths to skip during directory walks.
    pub excluded_paths: Vec<String>,
    pub entry_points: EntryPointConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            stereotypes: DEFAULT_STEREOTYPES.iter().map(|s| s.to_string()).collect(),
            excluded_paths: Vec::new(),
            entry_points: EntryPointConfig::default(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the first config file found in `dir`, or the defaults.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!(file = %candidate.display(), "loading config");
                return Self::parse_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Check that every glob pattern compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.excluded_matcher()?;
        self.entry_points.name_matcher()?;
        Ok(())
    }

    /// Compiled `excluded_paths`.
    pub fn excluded_matcher(&self) -> Result<GlobSet, ConfigError> {
        build_glob_set(&self.excluded_paths)
    }

    /// Cache store rooted at `cache_dir`, resolved against `project_root`.
    pub fn blob_store<P: AsRef<Path>>(&self, project_root: P) -> FsBlobStore {
        FsBlobStore::new(project_root.as_ref().join(&self.cache_dir))
    }
}

/// Which classes count as entry points for the unused-class detector.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntryPointConfig {
    /// Globs matched against the simple class name.
    pub class_name_patterns: Vec<String>,
    /// Annotation names that mark an entry point.
    pub annotations: Vec<String>,
    /// Treat classes with outgoing but no incoming edges as entry points.
    pub roots_are_entry_points: bool,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            class_name_patterns: ["*Application", "*Test", "*Tests", "Main"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            annotations: ["SpringBootApplication", "Controller", "RestController", "Test"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            roots_are_entry_points: true,
        }
    }
}

impl EntryPointConfig {
    /// No patterns, no annotations, no roots: every unreferenced class is unused.
    pub fn none() -> Self {
        Self {
            class_name_patterns: Vec::new(),
            annotations: Vec::new(),
            roots_are_entry_points: false,
        }
    }

    pub fn name_matcher(&self) -> Result<GlobSet, ConfigError> {
        build_glob_set(&self.class_name_patterns)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Pattern {
        pattern: patterns.join(","),
        source,
    })
}
