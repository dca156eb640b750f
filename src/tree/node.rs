//! Node model for hash-annotated trees.

use crate::types::DigestMap;
use std::path::{Path, PathBuf};

/// A single entry in the annotated tree: either a file leaf or a folder
/// with ordered children.
///
/// Nodes are created once (by the builder or a codec decode) and never
/// mutated afterwards. Ownership is strictly top-down; paths are stored
/// relative to the manifest root so no parent back-references are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Folder(FolderNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Entry name, unique among siblings.
    pub name: String,
    /// Path relative to the manifest root.
    pub path: PathBuf,
    /// Byte length at hash time. Optional because a decoded manifest may
    /// omit it.
    pub size: Option<u64>,
    /// Algorithm to lowercase-hex digest.
    pub digests: DigestMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Entry name; empty for the manifest root.
    pub name: String,
    /// Path relative to the manifest root; empty for the root itself.
    pub path: PathBuf,
    /// Sum of children's sizes.
    pub size: u64,
    /// Tree digests, computed only from children's names, kinds and digests.
    pub digests: DigestMap,
    /// Children in ascending byte-wise name order.
    pub children: Vec<Node>,
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Folder(d) => &d.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::File(f) => &f.path,
            Node::Folder(d) => &d.path,
        }
    }

    pub fn digests(&self) -> &DigestMap {
        match self {
            Node::File(f) => &f.digests,
            Node::Folder(d) => &d.digests,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    /// Size in bytes; a file with no recorded size counts as zero.
    pub fn size(&self) -> u64 {
        match self {
            Node::File(f) => f.size.unwrap_or(0),
            Node::Folder(d) => d.size,
        }
    }
}

/// Join a parent-relative path with a child name.
///
/// The root folder has an empty path, so its children's paths are bare names.
pub fn child_path(parent: &Path, name: &str) -> PathBuf {
    if parent.as_os_str().is_empty() {
        PathBuf::from(name)
    } else {
        parent.join(name)
    }
}

/// Display form of a node path for error reporting; the root maps to ".".
pub fn display_path(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.display().to_string()
    }
}
