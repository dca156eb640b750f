//! Error types for the manifest system.

use crate::types::Algorithm;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, encoding, decoding or validating manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable file {path:?}: {source}")]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("malformed hash token {token:?}: expected \"algorithm:hexdigest\"")]
    MalformedHashToken { token: String },

    #[error("{0} is not a tree hash scheme")]
    NotATreeScheme(Algorithm),

    #[error("{path}: no {algorithm} digest available for tree hashing")]
    MissingDigest { path: String, algorithm: Algorithm },

    #[error("conflicting entry {0:?}: used as both file and folder")]
    ConflictingPath(String),

    #[error("malformed manifest: {0}")]
    Decode(String),

    #[error("invalid hex digest: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
