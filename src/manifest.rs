//! High-level manifest operations tying walker, builder, codecs and
//! validator together. This is the surface the CLI (and library users)
//! call; the submodules stay format- and filesystem-agnostic.

use crate::codec::codec_for;
use crate::error::ManifestError;
use crate::tree::builder::TreeBuilder;
use crate::tree::hierarchy::Hierarchy;
use crate::tree::node::FolderNode;
use crate::tree::walker::{Walker, WalkerConfig};
use crate::types::{Format, ManifestConfig};
use crate::validate::{ValidationIssue, Validator};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// A built manifest tree together with the directory it is relative to.
#[derive(Debug)]
pub struct Manifest {
    /// Absolute base directory all node paths are relative to.
    pub root: PathBuf,
    pub tree: FolderNode,
}

impl Manifest {
    /// Serialize the tree in the given format.
    pub fn encode(&self, format: Format) -> Result<Vec<u8>, ManifestError> {
        codec_for(format).encode(&self.tree)
    }
}

/// Walk `paths`, hash everything found and build the manifest tree.
///
/// The manifest root is derived from the arguments: a single argument is
/// rooted at its parent directory (so the named entry itself appears in the
/// manifest), several arguments share their longest common ancestor
/// directory. All node paths in the resulting tree are relative to that
/// root.
pub fn create(
    paths: &[PathBuf],
    walker: &WalkerConfig,
    config: &ManifestConfig,
) -> Result<Manifest, ManifestError> {
    if paths.is_empty() {
        return Err(ManifestError::Config("no input paths given".to_string()));
    }
    let paths = absolutize(paths)?;
    let root = manifest_root(&paths)?;
    info!(root = %root.display(), inputs = paths.len(), "creating manifest");

    let files = Walker::new(walker.clone()).collect(&paths)?;
    debug!(files = files.len(), "collected files");

    let mut relative = Vec::with_capacity(files.len());
    for file in &files {
        let rel = file.strip_prefix(&root).map_err(|_| {
            ManifestError::Config(format!(
                "path {} escapes manifest root {}",
                file.display(),
                root.display()
            ))
        })?;
        relative.push(rel.to_path_buf());
    }

    let hierarchy = Hierarchy::from_paths(&relative)?;
    let tree = TreeBuilder::new(config)?.build(&root, &hierarchy)?;
    Ok(Manifest { root, tree })
}

/// Parse manifest bytes in the given format.
pub fn decode(bytes: &[u8], format: Format) -> Result<FolderNode, ManifestError> {
    codec_for(format).decode(bytes)
}

/// Decode a manifest and verify it against the directory at `root`.
pub fn validate(
    bytes: &[u8],
    format: Format,
    root: &Path,
) -> Result<Vec<ValidationIssue>, ManifestError> {
    let tree = decode(bytes, format)?;
    Validator::new(root).validate(&tree)
}

fn absolutize(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ManifestError> {
    let cwd = std::env::current_dir()?;
    Ok(paths
        .iter()
        .map(|p| normalize(&cwd.join(p)))
        .collect())
}

/// Drop `.` components and resolve `..` lexically so prefix stripping and
/// common-ancestor computation see comparable paths.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Base directory of the (absolute) argument paths. A single argument is
/// rooted at its parent, so the named file or folder appears as an entry in
/// the manifest; several arguments share their longest common ancestor.
fn manifest_root(paths: &[PathBuf]) -> Result<PathBuf, ManifestError> {
    if let [only] = paths {
        return Ok(only
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| only.clone()));
    }

    let mut prefix = paths[0].clone();
    for path in &paths[1..] {
        prefix = common_prefix(&prefix, path);
        if prefix.as_os_str().is_empty() {
            return Err(ManifestError::Config(
                "input paths share no common ancestor".to_string(),
            ));
        }
    }
    // identical file arguments collapse to a file prefix
    if prefix.is_file() {
        prefix = prefix
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ManifestError::Config("input path has no parent".to_string()))?;
    }
    Ok(prefix)
}

fn common_prefix(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}
