//! Project-wide identifier extraction.
//!
//! Walks a directory (or takes an explicit file list), extracts every
//! supported file in parallel and flattens the declared units into
//! [`Identifier`]s. Files that fail to read or parse are logged and skipped.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{Config, ConfigError};
use crate::frontend::{extract_file, frontend_for_path};
use crate::model::{known_identities, CodeFile, Identifier};

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "build", "dist", "vendor"];

#[derive(Debug, Clone, Default)]
pub struct IdentifierApp {
    excluded: Option<GlobSet>,
}

impl IdentifierApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip walked paths matching the config's `excluded_paths`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let excluded = config.excluded_matcher()?;
        Ok(Self {
            excluded: (!excluded.is_empty()).then_some(excluded),
        })
    }

    /// Identifiers of every supported file under `root`.
    pub fn analysis_path(&self, root: &Path) -> anyhow::Result<Vec<Identifier>> {
        if !root.exists() {
            anyhow::bail!("analysis path does not exist: {}", root.display());
        }
        let files = self.collect_files(root);
        debug!(root = %root.display(), files = files.len(), "collected source files");
        self.analysis_files(&files)
    }

    /// Identifiers of the given files, in path order.
    ///
    /// Type references resolve against every unit declared in `files`, so
    /// names imported with a wildcard find their project class.
    pub fn analysis_files(&self, files: &[PathBuf]) -> anyhow::Result<Vec<Identifier>> {
        let code_files = self.extract_files(files);
        let known = known_identities(&code_files);
        Ok(code_files
            .iter()
            .flat_map(|file| Identifier::from_file_in(file, &known))
            .collect())
    }

    /// Extract `files` in parallel. Results are sorted by path.
    pub fn extract_files(&self, files: &[PathBuf]) -> Vec<CodeFile> {
        let mut code_files: Vec<CodeFile> = files
            .par_iter()
            .filter_map(|path| match extract_file(path) {
                Ok(code_file) => Some(code_file),
                Err(e) => {
                    // Log but don't fail - some files may not be parseable
                    warn!(file = %path.display(), error = %e, "failed to extract file");
                    None
                }
            })
            .collect();

        code_files.sort_by(|a, b| a.path.cmp(&b.path));
        code_files
    }

    /// Supported source files under `root`, sorted.
    pub fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                // Hidden directories hold caches and VCS data, not sources
                !(e.depth() > 0
                    && e.file_type().is_dir()
                    && (name.starts_with('.') || SKIPPED_DIRS.iter().any(|dir| *dir == name)))
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| frontend_for_path(path).is_some())
            .filter(|path| !self.is_excluded(root, path))
            .collect();

        files.sort();
        files
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let Some(excluded) = &self.excluded else {
            return false;
        };
        let relative = path.strip_prefix(root).unwrap_or(path);
        excluded.is_match(relative) || excluded.is_match(path)
    }
}
