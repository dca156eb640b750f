//! Manifest verification against a directory on disk.
//!
//! Every file named by the manifest is re-read and re-hashed, every folder
//! digest is recomputed from the freshly computed child digests, and each
//! recomputed value is compared against the recorded one. The walk is
//! post-order and never stops at the first mismatch, so one run reports the
//! complete set of discrepancies. A corrupted file therefore surfaces once
//! for itself and once per ancestor folder whose tree digest no longer
//! matches.
//!
//! Digest algorithms are inherited downward: a child is checked with the
//! union of its own recorded algorithms and everything its ancestors record,
//! so a folder's tree digest can always be rebuilt even when a child omits
//! the scheme.

use crate::error::ManifestError;
use crate::tree::hasher::{file_digests, tree_digest, ChildRef};
use crate::tree::node::{display_path, FileNode, FolderNode, Node};
use crate::types::{Algorithm, DigestMap};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One discrepancy found while verifying a manifest against disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A recomputed digest differs from the recorded one.
    DigestMismatch {
        path: String,
        algorithm: Algorithm,
        expected: String,
        actual: String,
    },
    /// A file named by the manifest could not be read back.
    Unreadable { path: String, detail: String },
    /// A folder digest could not be recomputed because a child digest is
    /// missing, typically downstream of an unreadable file.
    Unverifiable { path: String, algorithm: Algorithm },
}

impl ValidationIssue {
    pub fn path(&self) -> &str {
        match self {
            ValidationIssue::DigestMismatch { path, .. } => path,
            ValidationIssue::Unreadable { path, .. } => path,
            ValidationIssue::Unverifiable { path, .. } => path,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DigestMismatch {
                path,
                algorithm,
                expected,
                actual,
            } => write!(
                f,
                "{}: {} check failure: {}, expected {}",
                path, algorithm, actual, expected
            ),
            ValidationIssue::Unreadable { path, detail } => {
                write!(f, "{}: unreadable: {}", path, detail)
            }
            ValidationIssue::Unverifiable { path, algorithm } => {
                write!(f, "{}: {} digest could not be recomputed", path, algorithm)
            }
        }
    }
}

/// Recomputes every digest in a decoded manifest against files under `root`.
pub struct Validator {
    root: PathBuf,
}

impl Validator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Validator { root: root.into() }
    }

    /// Verify the whole tree. An empty issue list means the directory
    /// matches the manifest exactly.
    pub fn validate(&self, tree: &FolderNode) -> Result<Vec<ValidationIssue>, ManifestError> {
        info!(root = %self.root.display(), "validating manifest");
        let mut issues = Vec::new();
        self.validate_folder(tree, &BTreeSet::new(), &mut issues)?;
        if issues.is_empty() {
            info!("manifest verified clean");
        } else {
            warn!(issues = issues.len(), "manifest verification failed");
        }
        Ok(issues)
    }

    /// Verify one folder and return its recomputed digests. `None` means a
    /// child could not be read, so no tree digest can be trusted.
    fn validate_folder(
        &self,
        folder: &FolderNode,
        inherited: &BTreeSet<Algorithm>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<Option<DigestMap>, ManifestError> {
        let algorithms: BTreeSet<Algorithm> = inherited
            .iter()
            .chain(folder.digests.keys())
            .copied()
            .collect();

        let mut recomputed_children: Vec<(&Node, Option<DigestMap>)> =
            Vec::with_capacity(folder.children.len());
        for child in &folder.children {
            let recomputed = match child {
                Node::Folder(sub) => self.validate_folder(sub, &algorithms, issues)?,
                Node::File(file) => self.validate_file(file, &algorithms, issues),
            };
            recomputed_children.push((child, recomputed));
        }

        let mut own = DigestMap::new();
        for &algorithm in algorithms.iter().filter(|a| a.is_tree_scheme()) {
            match self.folder_digest(folder, algorithm, &recomputed_children)? {
                Some(value) => {
                    own.insert(algorithm, value);
                }
                None => {
                    issues.push(ValidationIssue::Unverifiable {
                        path: display_path(&folder.path),
                        algorithm,
                    });
                }
            }
        }

        for (algorithm, expected) in &folder.digests {
            if let Some(actual) = own.get(algorithm) {
                if actual != expected {
                    issues.push(ValidationIssue::DigestMismatch {
                        path: display_path(&folder.path),
                        algorithm: *algorithm,
                        expected: expected.clone(),
                        actual: actual.clone(),
                    });
                }
            }
        }

        if own.len() == algorithms.iter().filter(|a| a.is_tree_scheme()).count() {
            Ok(Some(own))
        } else {
            Ok(None)
        }
    }

    /// Rebuild one tree digest from the children's recomputed digests.
    fn folder_digest(
        &self,
        folder: &FolderNode,
        algorithm: Algorithm,
        children: &[(&Node, Option<DigestMap>)],
    ) -> Result<Option<String>, ManifestError> {
        let mut refs = Vec::with_capacity(children.len());
        for (child, recomputed) in children {
            let Some(digests) = recomputed else {
                return Ok(None);
            };
            let Some(digest_hex) = digests.get(&algorithm) else {
                return Ok(None);
            };
            refs.push(ChildRef {
                name: child.name(),
                is_folder: child.is_folder(),
                digest_hex,
            });
        }
        refs.sort_by(|a, b| a.name.cmp(b.name));
        let value = tree_digest(&refs, algorithm)?;
        debug!(path = %display_path(&folder.path), %algorithm, "recomputed tree digest");
        Ok(Some(value))
    }

    /// Re-hash one file and compare against its recorded digests. Returns
    /// the recomputed digests, or `None` when the file cannot be read.
    fn validate_file(
        &self,
        file: &FileNode,
        inherited: &BTreeSet<Algorithm>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<DigestMap> {
        let algorithms: BTreeSet<Algorithm> = inherited
            .iter()
            .chain(file.digests.keys())
            .copied()
            .collect();

        let on_disk = self.root.join(&file.path);
        let recomputed = match file_digests(&on_disk, &algorithms) {
            Ok(map) => map,
            Err(err) => {
                issues.push(ValidationIssue::Unreadable {
                    path: display_path(&file.path),
                    detail: err.to_string(),
                });
                return None;
            }
        };

        for (algorithm, expected) in &file.digests {
            let actual = recomputed
                .get(algorithm)
                .expect("recomputed set includes every recorded algorithm");
            if actual != expected {
                issues.push(ValidationIssue::DigestMismatch {
                    path: display_path(&file.path),
                    algorithm: *algorithm,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
        Some(recomputed)
    }
}
