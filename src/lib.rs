//! Dirseal: Content-Addressed Directory Manifests
//!
//! Builds a deterministic, hash-annotated tree of a filesystem subtree using
//! git-compatible blob and tree digests, serializes it to XML or YAML, and
//! re-derives every digest from a decoded manifest to detect tampering.

pub mod cli;
pub mod codec;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod tree;
pub mod types;
pub mod validate;

pub use error::ManifestError;
pub use types::{Algorithm, Format, ManifestConfig, UnreadablePolicy};
