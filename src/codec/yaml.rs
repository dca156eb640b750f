//! Block-text codec.
//!
//! Document shape:
//!
//! ```yaml
//! size: 10
//! hash:
//!   git-sha1: 4808c7fcc73ec219284131739a8c2f08b38adfb0
//! contents:
//! - a/:
//!     size: 10
//!     hash:
//!       git-sha1: 4dce2f9162e3667092ddca52866dccc65e125cd7
//!     contents:
//!     - x.txt:
//!         size: 5
//!         hash:
//!           sha1: aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d
//! ```
//!
//! The root folder is the top-level mapping itself. Each `contents` entry is
//! a single-key mapping; a key ending in `/` denotes a folder (so empty
//! folders survive the round trip), anything else a file. `hash` maps
//! algorithm names to lowercase hex values. Folder sizes are recomputed on
//! decode as the sum of child sizes.

use crate::codec::{check_hex, ManifestCodec};
use crate::error::ManifestError;
use crate::tree::node::{child_path, FileNode, FolderNode, Node};
use crate::types::{Algorithm, DigestMap};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

pub struct YamlCodec;

impl ManifestCodec for YamlCodec {
    fn encode(&self, tree: &FolderNode) -> Result<Vec<u8>, ManifestError> {
        let doc = Value::Mapping(folder_body(tree));
        let text = serde_yaml::to_string(&doc)?;
        debug!(len = text.len(), "encoded YAML manifest");
        Ok(text.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<FolderNode, ManifestError> {
        let doc: Value = serde_yaml::from_slice(bytes)?;
        let body = doc.as_mapping().ok_or_else(|| {
            ManifestError::Decode("top-level document must be a mapping".to_string())
        })?;
        decode_folder(String::new(), Path::new(""), body)
    }
}

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

fn folder_body(folder: &FolderNode) -> Mapping {
    let mut body = Mapping::new();
    body.insert(key("size"), Value::Number(folder.size.into()));
    if !folder.digests.is_empty() {
        body.insert(key("hash"), Value::Mapping(hash_mapping(&folder.digests)));
    }
    if !folder.children.is_empty() {
        let entries = folder.children.iter().map(entry_value).collect();
        body.insert(key("contents"), Value::Sequence(entries));
    }
    body
}

fn file_body(file: &FileNode) -> Mapping {
    let mut body = Mapping::new();
    if let Some(size) = file.size {
        body.insert(key("size"), Value::Number(size.into()));
    }
    if !file.digests.is_empty() {
        body.insert(key("hash"), Value::Mapping(hash_mapping(&file.digests)));
    }
    body
}

fn hash_mapping(digests: &DigestMap) -> Mapping {
    let mut mapping = Mapping::new();
    for (algorithm, value) in digests {
        mapping.insert(key(algorithm.as_str()), key(value));
    }
    mapping
}

fn entry_value(node: &Node) -> Value {
    let mut entry = Mapping::new();
    match node {
        Node::Folder(folder) => {
            entry.insert(
                key(&format!("{}/", folder.name)),
                Value::Mapping(folder_body(folder)),
            );
        }
        Node::File(file) => {
            entry.insert(key(&file.name), Value::Mapping(file_body(file)));
        }
    }
    Value::Mapping(entry)
}

fn decode_folder(
    name: String,
    path: &Path,
    body: &Mapping,
) -> Result<FolderNode, ManifestError> {
    let digests = decode_hashes(body)?;

    let mut children = Vec::new();
    if let Some(contents) = body.get(&key("contents")) {
        let entries = contents.as_sequence().ok_or_else(|| {
            ManifestError::Decode("contents must be a sequence".to_string())
        })?;
        for entry in entries {
            children.push(decode_entry(path, entry)?);
        }
    }

    let size = children.iter().map(Node::size).sum();
    Ok(FolderNode {
        name,
        path: path.to_path_buf(),
        size,
        digests,
        children,
    })
}

fn decode_entry(parent: &Path, entry: &Value) -> Result<Node, ManifestError> {
    let mapping = entry.as_mapping().ok_or_else(|| {
        ManifestError::Decode("contents entry must be a mapping".to_string())
    })?;
    if mapping.len() != 1 {
        return Err(ManifestError::Decode(
            "contents entry must have exactly one key".to_string(),
        ));
    }
    let (entry_key, body) = mapping.iter().next().expect("len checked above");
    let entry_name = entry_key.as_str().ok_or_else(|| {
        ManifestError::Decode("entry name must be a string".to_string())
    })?;
    let body = body.as_mapping().ok_or_else(|| {
        ManifestError::Decode(format!("entry {:?} must map to a mapping", entry_name))
    })?;

    if let Some(folder_name) = entry_name.strip_suffix('/') {
        if folder_name.is_empty() {
            return Err(ManifestError::Decode("folder with empty name".to_string()));
        }
        let path = child_path(parent, folder_name);
        let folder = decode_folder(folder_name.to_string(), &path, body)?;
        return Ok(Node::Folder(folder));
    }

    if body.get(&key("contents")).is_some() {
        return Err(ManifestError::Decode(format!(
            "file entry {:?} cannot have contents",
            entry_name
        )));
    }

    let size = match body.get(&key("size")) {
        None => None,
        Some(value) => Some(value.as_u64().ok_or_else(|| {
            ManifestError::Decode(format!("invalid size for {:?}", entry_name))
        })?),
    };
    Ok(Node::File(FileNode {
        name: entry_name.to_string(),
        path: child_path(parent, entry_name),
        size,
        digests: decode_hashes(body)?,
    }))
}

fn decode_hashes(body: &Mapping) -> Result<DigestMap, ManifestError> {
    let Some(hash) = body.get(&key("hash")) else {
        return Ok(DigestMap::new());
    };
    let mapping = hash.as_mapping().ok_or_else(|| {
        ManifestError::Decode("hash must be a mapping".to_string())
    })?;

    let mut digests = DigestMap::new();
    for (name, value) in mapping {
        let name = name.as_str().ok_or_else(|| {
            ManifestError::Decode("hash algorithm name must be a string".to_string())
        })?;
        let algorithm: Algorithm = name.parse()?;
        let value = value.as_str().ok_or_else(|| {
            ManifestError::Decode(format!("hash value for {} must be a string", name))
        })?;
        check_hex(value, &format!("{}:{}", name, value))?;
        digests.insert(algorithm, value.to_string());
    }
    Ok(digests)
}
