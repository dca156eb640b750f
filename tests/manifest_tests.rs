//! End-to-end tests: build a directory on disk, create a manifest, encode,
//! decode and validate it, then corrupt files and check the error report.

use dirseal::manifest;
use dirseal::tree::node::Node;
use dirseal::tree::walker::WalkerConfig;
use dirseal::types::{Algorithm, Format, ManifestConfig};
use dirseal::validate::ValidationIssue;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("docs/img")).unwrap();
    fs::write(dir.path().join("docs/readme.md"), b"hello").unwrap();
    fs::write(dir.path().join("docs/img/logo.bin"), b"world").unwrap();
    fs::write(dir.path().join("data.csv"), b"a,b,c\n1,2,3\n").unwrap();
    dir
}

fn create(dir: &TempDir) -> manifest::Manifest {
    create_with(dir, &WalkerConfig::default())
}

// two sibling arguments root the manifest at their common ancestor, the
// fixture directory itself
fn create_with(dir: &TempDir, walker: &WalkerConfig) -> manifest::Manifest {
    manifest::create(
        &[dir.path().join("data.csv"), dir.path().join("docs")],
        walker,
        &ManifestConfig::default(),
    )
    .unwrap()
}

#[test]
fn clean_directory_validates_clean_in_both_formats() {
    let dir = fixture();
    let built = create(&dir);

    for format in [Format::Xml, Format::Yaml] {
        let bytes = built.encode(format).unwrap();
        let issues = manifest::validate(&bytes, format, dir.path()).unwrap();
        assert!(issues.is_empty(), "{:?}: {:?}", format, issues);
    }
}

#[test]
fn decode_reproduces_the_built_tree() {
    let dir = fixture();
    let built = create(&dir);

    for format in [Format::Xml, Format::Yaml] {
        let bytes = built.encode(format).unwrap();
        let decoded = manifest::decode(&bytes, format).unwrap();
        assert_eq!(decoded, built.tree, "{:?}", format);
    }
}

#[test]
fn known_content_yields_known_git_digests() {
    let dir = fixture();
    let built = create(&dir);

    let Node::Folder(docs) = &built.tree.children[1] else {
        panic!("expected docs folder");
    };
    let Node::File(readme) = &docs.children[1] else {
        panic!("expected readme.md");
    };
    assert_eq!(readme.name, "readme.md");
    assert_eq!(
        readme.digests[&Algorithm::GitSha1],
        "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0"
    );
    assert_eq!(
        readme.digests[&Algorithm::Sha1],
        "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    );
}

#[test]
fn tampering_one_file_reports_it_and_every_ancestor_only() {
    let dir = fixture();
    let built = create(&dir);
    let bytes = built.encode(Format::Xml).unwrap();

    fs::write(dir.path().join("docs/img/logo.bin"), b"WORLD").unwrap();

    let issues = manifest::validate(&bytes, Format::Xml, dir.path()).unwrap();
    let paths: Vec<&str> = issues.iter().map(ValidationIssue::path).collect();

    // the file itself: one mismatch per recorded algorithm (git-sha1 + sha1)
    assert_eq!(
        paths.iter().filter(|p| **p == "docs/img/logo.bin").count(),
        2
    );
    // each ancestor folder: one git-sha1 tree mismatch
    assert_eq!(paths.iter().filter(|p| **p == "docs/img").count(), 1);
    assert_eq!(paths.iter().filter(|p| **p == "docs").count(), 1);
    assert_eq!(paths.iter().filter(|p| **p == ".").count(), 1);
    // untouched siblings stay silent
    assert!(!paths.contains(&"data.csv"));
    assert!(!paths.contains(&"docs/readme.md"));
    assert_eq!(issues.len(), 5);
}

#[test]
fn deleted_file_reports_unreadable_not_mismatch() {
    let dir = fixture();
    let built = create(&dir);
    let bytes = built.encode(Format::Yaml).unwrap();

    fs::remove_file(dir.path().join("data.csv")).unwrap();

    let issues = manifest::validate(&bytes, Format::Yaml, dir.path()).unwrap();
    assert!(issues.iter().any(|i| matches!(
        i,
        ValidationIssue::Unreadable { path, .. } if path == "data.csv"
    )));
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::Unverifiable { path, .. } if path == ".")));
    assert!(!issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::DigestMismatch { .. })));
}

#[test]
fn added_file_goes_unnoticed_until_recreate() {
    // validation checks what the manifest names; extra files on disk only
    // matter for folder digests when the manifest is rebuilt
    let dir = fixture();
    let built = create(&dir);
    let bytes = built.encode(Format::Xml).unwrap();

    fs::write(dir.path().join("docs/extra.txt"), b"new").unwrap();
    let issues = manifest::validate(&bytes, Format::Xml, dir.path()).unwrap();
    assert!(issues.is_empty());

    let rebuilt = create(&dir);
    assert_ne!(rebuilt.tree.digests, built.tree.digests);
}

#[test]
fn excluded_names_are_skipped_everywhere() {
    let dir = fixture();
    fs::create_dir(dir.path().join("docs/.git")).unwrap();
    fs::write(dir.path().join("docs/.git/HEAD"), b"ref: refs/heads/main").unwrap();
    fs::write(dir.path().join("docs/.DS_Store"), b"junk").unwrap();

    let walker = WalkerConfig {
        exclude_names: vec![".git".to_string(), ".DS_Store".to_string()],
        ..WalkerConfig::default()
    };
    let built = create_with(&dir, &walker);

    let bytes = built.encode(Format::Xml).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains(".git"));
    assert!(!text.contains(".DS_Store"));
    // excluding the junk leaves the tree identical to the pristine fixture
    let pristine = create(&fixture());
    assert_eq!(pristine.tree.digests, built.tree.digests);
}

#[test]
fn manifest_is_stable_across_runs() {
    let dir = fixture();
    let first = create(&dir).encode(Format::Xml).unwrap();
    let second = create(&dir).encode(Format::Xml).unwrap();
    assert_eq!(first, second);
}

#[test]
fn validate_under_wrong_root_reports_every_file() {
    let dir = fixture();
    let bytes = create(&dir).encode(Format::Xml).unwrap();

    let empty = TempDir::new().unwrap();
    let issues = manifest::validate(&bytes, Format::Xml, empty.path()).unwrap();
    let unreadable: Vec<&str> = issues
        .iter()
        .filter(|i| matches!(i, ValidationIssue::Unreadable { .. }))
        .map(ValidationIssue::path)
        .collect();
    assert!(unreadable.contains(&"data.csv"));
    assert!(unreadable.contains(&"docs/readme.md"));
    assert!(unreadable.contains(&"docs/img/logo.bin"));
}

#[test]
fn cross_format_decode_agrees() {
    let dir = fixture();
    let built = create(&dir);
    let from_xml = manifest::decode(&built.encode(Format::Xml).unwrap(), Format::Xml).unwrap();
    let from_yaml = manifest::decode(&built.encode(Format::Yaml).unwrap(), Format::Yaml).unwrap();
    assert_eq!(from_xml, from_yaml);
}

#[test]
fn single_argument_appears_as_named_entry() {
    let dir = fixture();
    let built = manifest::create(
        &[dir.path().join("docs")],
        &WalkerConfig::default(),
        &ManifestConfig::default(),
    )
    .unwrap();

    // a lone argument is rooted at its parent, so "docs" itself shows up
    assert_eq!(built.root, dir.path());
    assert_eq!(built.tree.children.len(), 1);
    let Node::Folder(docs) = &built.tree.children[0] else {
        panic!("expected docs folder");
    };
    assert_eq!(docs.name, "docs");
    let readme = docs
        .children
        .iter()
        .find(|c| c.name() == "readme.md")
        .expect("readme present");
    assert_eq!(readme.path(), PathBuf::from("docs/readme.md").as_path());
}
