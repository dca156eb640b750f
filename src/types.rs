//! Core types shared across the manifest system.

use crate::error::ManifestError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Digest map attached to a node: algorithm name to lowercase hex value.
///
/// `BTreeMap` keeps the map ordered by algorithm, so serialized hash
/// attributes come out in a stable order.
pub type DigestMap = BTreeMap<Algorithm, String>;

/// Hash algorithms understood by the manifest system.
///
/// `Sha1` and `Sha256` hash raw file bytes. `GitSha1` hashes the
/// git object envelope: `"blob <size>\0"` + content for files, and the
/// canonical tree encoding for folders. It is currently the only scheme
/// usable for folder digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    Sha1,
    Sha256,
    GitSha1,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
            Algorithm::GitSha1 => "git-sha1",
        }
    }

    /// Whether this algorithm defines a folder (tree) digest scheme.
    pub fn is_tree_scheme(&self) -> bool {
        matches!(self, Algorithm::GitSha1)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(Algorithm::Sha1),
            "sha256" => Ok(Algorithm::Sha256),
            "git-sha1" => Ok(Algorithm::GitSha1),
            other => Err(ManifestError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Serialization format for manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Yaml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xml => f.write_str("xml"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for Format {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Format::Xml),
            "yaml" => Ok(Format::Yaml),
            other => Err(ManifestError::Config(format!(
                "unknown format: {} (must be 'xml' or 'yaml')",
                other
            ))),
        }
    }
}

/// Policy for files that cannot be read while building a manifest.
///
/// The default aborts the build: silently dropping a file would change the
/// manifest hash without the caller noticing. `SkipWithWarning` records a
/// `tracing::warn!` and excludes the file from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreadablePolicy {
    #[default]
    Abort,
    SkipWithWarning,
}

/// Explicit manifest configuration threaded through create and validate.
///
/// There is no process-wide state; every call receives the configuration it
/// operates under.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Algorithms computed for every file.
    pub file_algorithms: Vec<Algorithm>,
    /// Algorithms computed for every folder. Must be tree schemes.
    pub tree_algorithms: Vec<Algorithm>,
    /// Serialization format for encode/decode.
    pub format: Format,
    /// What to do when a file cannot be read during create.
    pub unreadable: UnreadablePolicy,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_algorithms: vec![Algorithm::GitSha1, Algorithm::Sha1],
            tree_algorithms: vec![Algorithm::GitSha1],
            format: Format::Xml,
            unreadable: UnreadablePolicy::Abort,
        }
    }
}

impl ManifestConfig {
    /// Validate that every configured tree algorithm is actually a tree scheme.
    pub fn check(&self) -> Result<(), ManifestError> {
        for algorithm in &self.tree_algorithms {
            if !algorithm.is_tree_scheme() {
                return Err(ManifestError::NotATreeScheme(*algorithm));
            }
        }
        Ok(())
    }
}
