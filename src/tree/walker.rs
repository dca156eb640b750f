//! Filesystem walker: expands file and directory arguments into a
//! deduplicated, sorted list of file paths.
//!
//! This is the only component that touches directory traversal; the core
//! builder receives an already-flattened hierarchy.

use crate::error::ManifestError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    pub follow_symlinks: bool,
    /// Entry names to skip entirely (files and folders alike).
    pub exclude_names: Vec<String>,
    /// Exact paths to skip, e.g. the manifest output file itself.
    pub exclude_paths: Vec<PathBuf>,
}

/// Filesystem walker
pub struct Walker {
    config: WalkerConfig,
}

impl Walker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Expand `paths` (files and/or directories) into the sorted set of
    /// files beneath them. Duplicates collapse; exclusions are dropped.
    pub fn collect(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, ManifestError> {
        let mut files = BTreeSet::new();

        for path in paths {
            if path.is_file() {
                if !self.is_excluded(path) {
                    files.insert(path.clone());
                }
                continue;
            }
            if !path.is_dir() {
                return Err(ManifestError::Config(format!(
                    "{:?} is neither a file nor a directory",
                    path
                )));
            }

            let walker = WalkDir::new(path).follow_links(self.config.follow_symlinks);
            for entry in walker {
                let entry = entry.map_err(|e| {
                    ManifestError::Config(format!("failed to walk {:?}: {}", path, e))
                })?;
                // Excluded folders are pruned by the ancestor check on each
                // descendant file.
                if entry.file_type().is_file()
                    && !self.is_excluded(entry.path())
                    && !self.has_excluded_ancestor(entry.path(), path)
                {
                    files.insert(entry.path().to_path_buf());
                }
            }
        }

        Ok(files.into_iter().collect())
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.config.exclude_paths.iter().any(|p| p == path) {
            return true;
        }
        match path.file_name() {
            Some(name) => self
                .config
                .exclude_names
                .iter()
                .any(|pattern| name.to_string_lossy() == pattern.as_str()),
            None => false,
        }
    }

    fn has_excluded_ancestor(&self, path: &Path, root: &Path) -> bool {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == root {
                break;
            }
            if self.is_excluded(dir) {
                return true;
            }
            current = dir.parent();
        }
        false
    }
}
