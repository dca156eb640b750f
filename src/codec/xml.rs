//! Structured-markup codec.
//!
//! Document shape:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <dataset xmlns="urn:dirseal:manifest:v1">
//!   <contents hash="git-sha1:...">
//!     <folder name="a" hash="git-sha1:...">
//!       <file name="x.txt" size="5" hash="sha1:... git-sha1:..."/>
//!     </folder>
//!   </contents>
//! </dataset>
//! ```
//!
//! `contents` is the unnamed root folder; nested folders carry a `name`.
//! Decode walks top-down, accumulating each node's path from the names
//! along the way, and recomputes folder sizes as the sum of child sizes.

use crate::codec::{format_hash_tokens, parse_hash_tokens, ManifestCodec};
use crate::error::ManifestError;
use crate::tree::node::{child_path, FileNode, FolderNode, Node};
use crate::types::DigestMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::path::PathBuf;
use tracing::debug;

/// Namespace of the manifest schema, v1.
pub const XML_NAMESPACE: &str = "urn:dirseal:manifest:v1";

pub struct XmlCodec;

impl ManifestCodec for XmlCodec {
    fn encode(&self, tree: &FolderNode) -> Result<Vec<u8>, ManifestError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut dataset = BytesStart::new("dataset");
        dataset.push_attribute(("xmlns", XML_NAMESPACE));
        writer.write_event(Event::Start(dataset))?;

        write_folder(&mut writer, tree, true)?;

        writer.write_event(Event::End(BytesEnd::new("dataset")))?;
        let bytes = writer.into_inner();
        debug!(len = bytes.len(), "encoded XML manifest");
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<FolderNode, ManifestError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<PendingFolder> = Vec::new();
        let mut root: Option<FolderNode> = None;
        let mut seen_dataset = false;
        let mut open_file = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Start(e) => {
                    if open_file {
                        return Err(ManifestError::Decode(
                            "file elements cannot have children".to_string(),
                        ));
                    }
                    match e.local_name().as_ref() {
                        b"dataset" => {
                            if seen_dataset {
                                return Err(ManifestError::Decode(
                                    "nested dataset element".to_string(),
                                ));
                            }
                            seen_dataset = true;
                        }
                        b"contents" => {
                            stack.push(begin_folder(&e, &stack, &root, true)?)
                        }
                        b"folder" => {
                            stack.push(begin_folder(&e, &stack, &root, false)?)
                        }
                        b"file" => {
                            attach_file(&e, &mut stack)?;
                            open_file = true;
                        }
                        other => {
                            return Err(ManifestError::Decode(format!(
                                "unexpected element <{}>",
                                String::from_utf8_lossy(other)
                            )))
                        }
                    }
                }
                Event::Empty(e) => {
                    if open_file {
                        return Err(ManifestError::Decode(
                            "file elements cannot have children".to_string(),
                        ));
                    }
                    match e.local_name().as_ref() {
                        b"contents" => {
                            let pending = begin_folder(&e, &stack, &root, true)?;
                            finish_folder(pending, &mut stack, &mut root);
                        }
                        b"folder" => {
                            let pending = begin_folder(&e, &stack, &root, false)?;
                            finish_folder(pending, &mut stack, &mut root);
                        }
                        b"file" => attach_file(&e, &mut stack)?,
                        other => {
                            return Err(ManifestError::Decode(format!(
                                "unexpected element <{}/>",
                                String::from_utf8_lossy(other)
                            )))
                        }
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"file" => open_file = false,
                    b"contents" | b"folder" => {
                        let pending = stack.pop().ok_or_else(|| {
                            ManifestError::Decode("unbalanced folder element".to_string())
                        })?;
                        finish_folder(pending, &mut stack, &mut root);
                    }
                    b"dataset" => {}
                    other => {
                        return Err(ManifestError::Decode(format!(
                            "unexpected closing </{}>",
                            String::from_utf8_lossy(other)
                        )))
                    }
                },
                Event::Text(t) => {
                    return Err(ManifestError::Decode(format!(
                        "unexpected text content {:?}",
                        String::from_utf8_lossy(&t)
                    )))
                }
                Event::CData(_) => {
                    return Err(ManifestError::Decode(
                        "unexpected CDATA content".to_string(),
                    ))
                }
                Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ManifestError::Decode("unterminated folder".to_string()));
        }
        root.ok_or_else(|| ManifestError::Decode("no contents element".to_string()))
    }
}

/// Folder being decoded, waiting for its closing tag.
struct PendingFolder {
    name: String,
    path: PathBuf,
    digests: DigestMap,
    children: Vec<Node>,
}

struct ElementAttrs {
    name: Option<String>,
    size: Option<u64>,
    digests: DigestMap,
}

fn write_folder(
    writer: &mut Writer<Vec<u8>>,
    folder: &FolderNode,
    is_root: bool,
) -> Result<(), ManifestError> {
    let tag = if is_root { "contents" } else { "folder" };
    let mut elem = BytesStart::new(tag);
    if !is_root {
        elem.push_attribute(("name", folder.name.as_str()));
    }
    if !folder.digests.is_empty() {
        elem.push_attribute(("hash", format_hash_tokens(&folder.digests).as_str()));
    }

    if folder.children.is_empty() {
        writer.write_event(Event::Empty(elem))?;
        return Ok(());
    }

    writer.write_event(Event::Start(elem))?;
    for child in &folder.children {
        match child {
            Node::Folder(sub) => write_folder(writer, sub, false)?,
            Node::File(file) => write_file(writer, file)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_file(writer: &mut Writer<Vec<u8>>, file: &FileNode) -> Result<(), ManifestError> {
    let mut elem = BytesStart::new("file");
    elem.push_attribute(("name", file.name.as_str()));
    if let Some(size) = file.size {
        elem.push_attribute(("size", size.to_string().as_str()));
    }
    if !file.digests.is_empty() {
        elem.push_attribute(("hash", format_hash_tokens(&file.digests).as_str()));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn parse_attrs(e: &BytesStart) -> Result<ElementAttrs, ManifestError> {
    let mut out = ElementAttrs {
        name: None,
        size: None,
        digests: DigestMap::new(),
    };
    for attr in e.attributes() {
        let attr =
            attr.map_err(|e| ManifestError::Decode(format!("bad attribute: {}", e)))?;
        match attr.key.as_ref() {
            b"name" => out.name = Some(attr.unescape_value()?.into_owned()),
            b"size" => {
                let raw = attr.unescape_value()?;
                out.size = Some(raw.parse().map_err(|_| {
                    ManifestError::Decode(format!("invalid size {:?}", raw))
                })?);
            }
            b"hash" => out.digests = parse_hash_tokens(&attr.unescape_value()?)?,
            key if key.starts_with(b"xmlns") => {}
            key => {
                return Err(ManifestError::Decode(format!(
                    "unexpected attribute {:?}",
                    String::from_utf8_lossy(key)
                )))
            }
        }
    }
    Ok(out)
}

fn begin_folder(
    e: &BytesStart,
    stack: &[PendingFolder],
    root: &Option<FolderNode>,
    is_root: bool,
) -> Result<PendingFolder, ManifestError> {
    let attrs = parse_attrs(e)?;
    if is_root {
        if !stack.is_empty() || root.is_some() {
            return Err(ManifestError::Decode(
                "contents element must be the single root folder".to_string(),
            ));
        }
        return Ok(PendingFolder {
            name: String::new(),
            path: PathBuf::new(),
            digests: attrs.digests,
            children: Vec::new(),
        });
    }

    let parent = stack.last().ok_or_else(|| {
        ManifestError::Decode("folder element outside contents".to_string())
    })?;
    let name = attrs
        .name
        .ok_or_else(|| ManifestError::Decode("folder without name".to_string()))?;
    let path = child_path(&parent.path, &name);
    Ok(PendingFolder {
        name,
        path,
        digests: attrs.digests,
        children: Vec::new(),
    })
}

fn attach_file(e: &BytesStart, stack: &mut [PendingFolder]) -> Result<(), ManifestError> {
    let attrs = parse_attrs(e)?;
    let parent = stack.last_mut().ok_or_else(|| {
        ManifestError::Decode("file element outside contents".to_string())
    })?;
    let name = attrs
        .name
        .ok_or_else(|| ManifestError::Decode("file without name".to_string()))?;
    let path = child_path(&parent.path, &name);
    parent.children.push(Node::File(FileNode {
        name,
        path,
        size: attrs.size,
        digests: attrs.digests,
    }));
    Ok(())
}

fn finish_folder(
    pending: PendingFolder,
    stack: &mut Vec<PendingFolder>,
    root: &mut Option<FolderNode>,
) {
    let size = pending.children.iter().map(Node::size).sum();
    let folder = FolderNode {
        name: pending.name,
        path: pending.path,
        size,
        digests: pending.digests,
        children: pending.children,
    };
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Folder(folder)),
        None => *root = Some(folder),
    }
}
