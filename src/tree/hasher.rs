//! Digest computation for files and folders.
//!
//! Files are streamed once in fixed-size chunks while every requested
//! hasher runs concurrently over the same bytes. The `git-sha1` scheme is
//! seeded with the git blob envelope (`"blob <size>\0"`) before any content
//! byte. Folder digests hash the canonical git tree encoding of the
//! already-hashed, name-sorted children.

use crate::error::ManifestError;
use crate::types::{Algorithm, DigestMap};
use digest::DynDigest;
use sha1::Sha1;
use sha2::Sha256;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Read chunk size for file hashing.
const CHUNK_SIZE: usize = 4096;

/// Git tree entry mode for regular files.
pub const MODE_FILE: &str = "100644";
/// Git tree entry mode for folders.
pub const MODE_FOLDER: &str = "40000";

/// An already-hashed child, as seen from its parent folder.
#[derive(Debug, Clone, Copy)]
pub struct ChildRef<'a> {
    pub name: &'a str,
    pub is_folder: bool,
    pub digest_hex: &'a str,
}

fn new_hasher(algorithm: Algorithm) -> Box<dyn DynDigest> {
    match algorithm {
        Algorithm::Sha1 | Algorithm::GitSha1 => Box::new(Sha1::default()),
        Algorithm::Sha256 => Box::new(Sha256::default()),
    }
}

/// Compute the requested digests of one file in a single streamed read.
///
/// Open, metadata and read failures are reported as `UnreadableFile` so the
/// caller can apply its partial-failure policy.
pub fn file_digests(
    path: &Path,
    algorithms: &BTreeSet<Algorithm>,
) -> Result<DigestMap, ManifestError> {
    if algorithms.is_empty() {
        return Ok(DigestMap::new());
    }

    let unreadable = |source: std::io::Error| ManifestError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(unreadable)?.len();

    let mut hashers: Vec<(Algorithm, Box<dyn DynDigest>)> = algorithms
        .iter()
        .map(|&algorithm| {
            let mut hasher = new_hasher(algorithm);
            if algorithm == Algorithm::GitSha1 {
                hasher.update(format!("blob {}", size).as_bytes());
                hasher.update(&[0u8]);
            }
            (algorithm, hasher)
        })
        .collect();

    let mut file = File::open(path).map_err(unreadable)?;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(unreadable)?;
        if n == 0 {
            break;
        }
        for (_, hasher) in &mut hashers {
            hasher.update(&buf[..n]);
        }
    }

    let digests: DigestMap = hashers
        .into_iter()
        .map(|(algorithm, hasher)| (algorithm, hex::encode(hasher.finalize())))
        .collect();
    trace!(path = %path.display(), count = digests.len(), "hashed file");
    Ok(digests)
}

/// Compute a folder's tree digest from its name-sorted children.
///
/// The payload concatenates, per child, `mode + " " + name + "\0"` followed
/// by the raw digest bytes; the digest is then taken over
/// `"tree <len>\0" + payload`. An empty folder hashes `"tree 0\0"`.
pub fn tree_digest(
    children: &[ChildRef<'_>],
    algorithm: Algorithm,
) -> Result<String, ManifestError> {
    if !algorithm.is_tree_scheme() {
        return Err(ManifestError::NotATreeScheme(algorithm));
    }

    let mut payload = Vec::new();
    for child in children {
        let mode = if child.is_folder { MODE_FOLDER } else { MODE_FILE };
        payload.extend_from_slice(mode.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(child.name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(&hex::decode(child.digest_hex)?);
    }

    let mut hasher = new_hasher(algorithm);
    hasher.update(format!("tree {}", payload.len()).as_bytes());
    hasher.update(&[0u8]);
    hasher.update(&payload);
    Ok(hex::encode(hasher.finalize()))
}
