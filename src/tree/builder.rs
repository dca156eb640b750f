//! Tree builder: hierarchy + hash engine → immutable annotated tree.
//!
//! Construction is strictly bottom-up (post-order): a folder's tree digest
//! is computed only after every child carries its own digests.

use crate::error::ManifestError;
use crate::tree::hasher::{self, ChildRef};
use crate::tree::hierarchy::{Hierarchy, HierarchyEntry};
use crate::tree::node::{child_path, FileNode, FolderNode, Node};
use crate::types::{Algorithm, DigestMap, ManifestConfig, UnreadablePolicy};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tree builder for a fixed algorithm configuration.
pub struct TreeBuilder {
    /// Algorithms computed per file: the configured file set unioned with
    /// the tree set, since tree digests are derived from child blob digests.
    file_algorithms: BTreeSet<Algorithm>,
    tree_algorithms: BTreeSet<Algorithm>,
    unreadable: UnreadablePolicy,
}

impl TreeBuilder {
    pub fn new(config: &ManifestConfig) -> Result<Self, ManifestError> {
        config.check()?;
        let mut file_algorithms: BTreeSet<Algorithm> =
            config.file_algorithms.iter().copied().collect();
        file_algorithms.extend(config.tree_algorithms.iter().copied());
        Ok(Self {
            file_algorithms,
            tree_algorithms: config.tree_algorithms.iter().copied().collect(),
            unreadable: config.unreadable,
        })
    }

    /// Build the annotated tree for `hierarchy`, reading file bytes under
    /// `root`. The returned root folder has an empty name and path.
    pub fn build(
        &self,
        root: &Path,
        hierarchy: &Hierarchy,
    ) -> Result<FolderNode, ManifestError> {
        let start = Instant::now();
        info!(root = %root.display(), "building annotated tree");

        let tree = self.build_folder(root, Path::new(""), "", hierarchy)?;

        info!(
            files = count_files(&tree),
            total_size = tree.size,
            duration_ms = start.elapsed().as_millis() as u64,
            "tree build completed"
        );
        Ok(tree)
    }

    fn build_file(
        &self,
        root: &Path,
        rel: &Path,
        name: &str,
    ) -> Result<FileNode, ManifestError> {
        let full = root.join(rel);
        let size = std::fs::metadata(&full)
            .map_err(|source| ManifestError::UnreadableFile {
                path: full.clone(),
                source,
            })?
            .len();
        let digests = hasher::file_digests(&full, &self.file_algorithms)?;
        Ok(FileNode {
            name: name.to_string(),
            path: rel.to_path_buf(),
            size: Some(size),
            digests,
        })
    }

    fn build_folder(
        &self,
        root: &Path,
        rel: &Path,
        name: &str,
        hierarchy: &Hierarchy,
    ) -> Result<FolderNode, ManifestError> {
        let mut children = Vec::new();

        for (child_name, entry) in hierarchy.entries() {
            let child_rel = child_path(rel, child_name);
            match entry {
                HierarchyEntry::File => {
                    match self.build_file(root, &child_rel, child_name) {
                        Ok(file) => children.push(Node::File(file)),
                        Err(err @ ManifestError::UnreadableFile { .. }) => {
                            match self.unreadable {
                                UnreadablePolicy::Abort => return Err(err),
                                UnreadablePolicy::SkipWithWarning => {
                                    warn!(path = %child_rel.display(), %err,
                                        "skipping unreadable file");
                                }
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
                HierarchyEntry::Folder(sub) => {
                    let folder = self.build_folder(root, &child_rel, child_name, sub)?;
                    children.push(Node::Folder(folder));
                }
            }
        }

        let size = children.iter().map(Node::size).sum();
        let digests = self.folder_digests(&children)?;
        debug!(path = %rel.display(), children = children.len(), "hashed folder");

        Ok(FolderNode {
            name: name.to_string(),
            path: rel.to_path_buf(),
            size,
            digests,
            children,
        })
    }

    fn folder_digests(&self, children: &[Node]) -> Result<DigestMap, ManifestError> {
        let mut digests = DigestMap::new();
        for &algorithm in &self.tree_algorithms {
            let refs = children
                .iter()
                .map(|child| {
                    let digest_hex = child.digests().get(&algorithm).ok_or_else(|| {
                        ManifestError::MissingDigest {
                            path: child.path().display().to_string(),
                            algorithm,
                        }
                    })?;
                    Ok(ChildRef {
                        name: child.name(),
                        is_folder: child.is_folder(),
                        digest_hex,
                    })
                })
                .collect::<Result<Vec<_>, ManifestError>>()?;
            digests.insert(algorithm, hasher::tree_digest(&refs, algorithm)?);
        }
        Ok(digests)
    }
}

fn count_files(folder: &FolderNode) -> usize {
    folder
        .children
        .iter()
        .map(|child| match child {
            Node::File(_) => 1,
            Node::Folder(sub) => count_files(sub),
        })
        .sum()
}
