//! Property-based tests for determinism and round-trip guarantees.

use dirseal::codec::codec_for;
use dirseal::tree::node::{child_path, FileNode, FolderNode, Node};
use dirseal::types::{Algorithm, DigestMap, Format};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Path-free description of a tree, materialized into a `FolderNode` with
/// consistent paths and folder sizes before feeding it to a codec.
#[derive(Debug, Clone)]
enum Shape {
    File { size: u64, digests: DigestMap },
    Folder { children: BTreeMap<String, Shape>, digests: DigestMap },
}

fn algorithm_strategy() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::Sha1),
        Just(Algorithm::Sha256),
        Just(Algorithm::GitSha1),
    ]
}

fn digests_strategy() -> impl Strategy<Value = DigestMap> {
    prop::collection::btree_map(algorithm_strategy(), "[0-9a-f]{40}", 0..3)
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,7}"
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let file = (0u64..1 << 32, digests_strategy())
        .prop_map(|(size, digests)| Shape::File { size, digests });
    file.prop_recursive(3, 24, 4, |inner| {
        (
            prop::collection::btree_map(name_strategy(), inner, 0..4),
            digests_strategy(),
        )
            .prop_map(|(children, digests)| Shape::Folder { children, digests })
    })
}

fn root_strategy() -> impl Strategy<Value = FolderNode> {
    (
        prop::collection::btree_map(name_strategy(), shape_strategy(), 0..5),
        digests_strategy(),
    )
        .prop_map(|(children, digests)| {
            materialize_folder(String::new(), Path::new(""), &children, digests)
        })
}

fn materialize(name: &str, path: &Path, shape: &Shape) -> Node {
    match shape {
        Shape::File { size, digests } => Node::File(FileNode {
            name: name.to_string(),
            path: path.to_path_buf(),
            size: Some(*size),
            digests: digests.clone(),
        }),
        Shape::Folder { children, digests } => Node::Folder(materialize_folder(
            name.to_string(),
            path,
            children,
            digests.clone(),
        )),
    }
}

fn materialize_folder(
    name: String,
    path: &Path,
    children: &BTreeMap<String, Shape>,
    digests: DigestMap,
) -> FolderNode {
    let children: Vec<Node> = children
        .iter()
        .map(|(child_name, shape)| materialize(child_name, &child_path(path, child_name), shape))
        .collect();
    let size = children.iter().map(Node::size).sum();
    FolderNode {
        name,
        path: path.to_path_buf(),
        size,
        digests,
        children,
    }
}

/// decode(encode(t)) == t, for any well-formed tree, in both formats.
#[test]
fn test_codec_round_trip_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&root_strategy(), |tree| {
            for format in [Format::Xml, Format::Yaml] {
                let codec = codec_for(format);
                let encoded = codec.encode(&tree).unwrap();
                let decoded = codec.decode(&encoded).unwrap();
                prop_assert_eq!(&decoded, &tree, "format {:?}", format);
            }
            Ok(())
        })
        .unwrap();
}

/// Encoding is a pure function of the tree: byte-identical across calls,
/// and stable under a decode/encode cycle.
#[test]
fn test_encoding_is_stable_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&root_strategy(), |tree| {
            for format in [Format::Xml, Format::Yaml] {
                let codec = codec_for(format);
                let first = codec.encode(&tree).unwrap();
                let second = codec.encode(&tree).unwrap();
                prop_assert_eq!(&first, &second);

                let reencoded = codec.encode(&codec.decode(&first).unwrap()).unwrap();
                prop_assert_eq!(&first, &reencoded, "format {:?}", format);
            }
            Ok(())
        })
        .unwrap();
}

fn relative_paths_strategy() -> impl Strategy<Value = Vec<std::path::PathBuf>> {
    // folder segments never contain '.', file names always end in ".f", so
    // no generated file path can collide with a folder prefix
    let path = (
        prop::collection::vec("[a-z][a-z0-9_]{0,5}", 0..3),
        "[a-z][a-z0-9_]{0,5}\\.f",
    )
        .prop_map(|(dirs, file)| {
            let mut p = std::path::PathBuf::new();
            for dir in dirs {
                p.push(dir);
            }
            p.push(file);
            p
        });
    prop::collection::vec(path, 1..12)
}

/// The hierarchy a path list builds is independent of the list's order.
#[test]
fn test_hierarchy_is_order_invariant() {
    use dirseal::tree::hierarchy::Hierarchy;

    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&relative_paths_strategy(), |paths| {
            let mut reversed = paths.clone();
            reversed.reverse();

            let forward = Hierarchy::from_paths(&paths).unwrap();
            let backward = Hierarchy::from_paths(&reversed).unwrap();
            prop_assert_eq!(forward, backward);
            Ok(())
        })
        .unwrap();
}
