//! CLI parse: clap types for dirseal. No behavior; definitions only.

use crate::types::{Algorithm, Format};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dirseal - deterministic, content-addressed directory manifests
#[derive(Parser)]
#[command(name = "dirseal")]
#[command(about = "Create and verify content-addressed directory manifests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hash files and folders and write a manifest
    Create {
        /// Manifest format (xml, yaml)
        #[arg(long, default_value = "xml")]
        format: Format,

        /// Digest algorithms for files, comma-separated
        /// (sha1, sha256, git-sha1)
        #[arg(long, value_delimiter = ',', default_value = "git-sha1,sha1")]
        hash_files: Vec<Algorithm>,

        /// Digest algorithms for folders, comma-separated (tree schemes only)
        #[arg(long, value_delimiter = ',', default_value = "git-sha1")]
        hash_trees: Vec<Algorithm>,

        /// Write the manifest here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Entry name to skip anywhere in the walk (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Skip unreadable files with a warning instead of aborting
        #[arg(long)]
        skip_unreadable: bool,

        /// Files and/or directories to include
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Recompute every digest in a manifest and report discrepancies
    Validate {
        /// Manifest format (xml, yaml)
        #[arg(long, default_value = "xml")]
        format: Format,

        /// Directory the manifest paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Manifest file to verify (stdin when omitted)
        file: Option<PathBuf>,
    },
}
