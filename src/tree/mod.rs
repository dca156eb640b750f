//! Hash-Annotated Filesystem Tree
//!
//! Represents a filesystem subtree as an immutable tree where every file
//! carries content digests and every folder carries a git-compatible tree
//! digest over its name-sorted children.

pub mod builder;
pub mod hasher;
pub mod hierarchy;
pub mod node;
pub mod walker;
