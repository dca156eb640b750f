//! Path hierarchy: a flat, sorted set of relative file paths folded into a
//! nested name-ordered structure.
//!
//! `BTreeMap<String, _>` iteration order is ascending byte-wise on the UTF-8
//! encoding, which is exactly the canonical child ordering the tree digests
//! depend on.

use crate::error::ManifestError;
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// One entry in a hierarchy level: a file leaf or a nested folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyEntry {
    File,
    Folder(Hierarchy),
}

/// Nested folder structure keyed by entry name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hierarchy {
    entries: BTreeMap<String, HierarchyEntry>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from relative file paths.
    ///
    /// Duplicate paths collapse into one entry; a name used both as a file
    /// and as a folder is rejected.
    pub fn from_paths<I, P>(paths: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut hierarchy = Self::new();
        for path in paths {
            hierarchy.insert_file(path.as_ref())?;
        }
        Ok(hierarchy)
    }

    /// Insert a single relative file path, creating intermediate folders.
    pub fn insert_file(&mut self, path: &Path) -> Result<(), ManifestError> {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    components.push(name.to_string_lossy().into_owned())
                }
                Component::CurDir => {}
                _ => {
                    return Err(ManifestError::Config(format!(
                        "path {:?} is not a plain relative path",
                        path
                    )))
                }
            }
        }
        if components.is_empty() {
            return Err(ManifestError::Config(format!("empty path {:?}", path)));
        }

        let mut level = self;
        let last = components.len() - 1;
        for (idx, name) in components.into_iter().enumerate() {
            if idx == last {
                match level.entries.get(&name) {
                    Some(HierarchyEntry::Folder(_)) => {
                        return Err(ManifestError::ConflictingPath(name))
                    }
                    _ => {
                        level.entries.insert(name, HierarchyEntry::File);
                    }
                }
            } else {
                let entry = level
                    .entries
                    .entry(name.clone())
                    .or_insert_with(|| HierarchyEntry::Folder(Hierarchy::new()));
                level = match entry {
                    HierarchyEntry::Folder(sub) => sub,
                    HierarchyEntry::File => {
                        return Err(ManifestError::ConflictingPath(name))
                    }
                };
            }
        }
        Ok(())
    }

    /// Entries in ascending byte-wise name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &HierarchyEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
