//! CLI route: single route table dispatching to the manifest facade.

use crate::cli::parse::Commands;
use crate::error::ManifestError;
use crate::manifest;
use crate::tree::walker::WalkerConfig;
use crate::types::{Algorithm, Format, ManifestConfig, UnreadablePolicy};
use crate::validate::ValidationIssue;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// What a command run produced, for the binary to turn into output and an
/// exit code.
#[derive(Debug)]
pub enum CommandOutcome {
    Success,
    /// The manifest decoded fine but the directory does not match it.
    ValidationFailed(Vec<ValidationIssue>),
}

/// Runtime context for CLI execution.
pub struct RunContext;

impl RunContext {
    pub fn new() -> Self {
        RunContext
    }

    /// Execute one parsed command.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutcome, ManifestError> {
        match command {
            Commands::Create {
                format,
                hash_files,
                hash_trees,
                output,
                exclude,
                skip_unreadable,
                paths,
            } => self.run_create(
                *format,
                hash_files,
                hash_trees,
                output.as_deref(),
                exclude,
                *skip_unreadable,
                paths,
            ),
            Commands::Validate { format, root, file } => {
                self.run_validate(*format, root, file.as_deref())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_create(
        &self,
        format: Format,
        hash_files: &[Algorithm],
        hash_trees: &[Algorithm],
        output: Option<&Path>,
        exclude: &[String],
        skip_unreadable: bool,
        paths: &[PathBuf],
    ) -> Result<CommandOutcome, ManifestError> {
        let started = Instant::now();

        let config = ManifestConfig {
            file_algorithms: hash_files.to_vec(),
            tree_algorithms: hash_trees.to_vec(),
            format,
            unreadable: if skip_unreadable {
                UnreadablePolicy::SkipWithWarning
            } else {
                UnreadablePolicy::Abort
            },
        };

        // never hash the manifest we are about to write; the walker matches
        // on the same normalized absolute form it walks
        let exclude_paths = match output {
            Some(path) => {
                let cwd = std::env::current_dir()?;
                vec![manifest::normalize(&cwd.join(path))]
            }
            None => Vec::new(),
        };
        let walker = WalkerConfig {
            exclude_names: exclude.to_vec(),
            exclude_paths,
            ..WalkerConfig::default()
        };

        let built = manifest::create(paths, &walker, &config)?;
        let bytes = built.encode(format)?;

        match output {
            Some(path) => {
                std::fs::write(path, &bytes)?;
                info!(
                    path = %path.display(),
                    bytes = bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "manifest written"
                );
            }
            None => {
                // stdout carries the manifest; logs go to stderr
                std::io::stdout().write_all(&bytes)?;
            }
        }
        Ok(CommandOutcome::Success)
    }

    fn run_validate(
        &self,
        format: Format,
        root: &Path,
        file: Option<&Path>,
    ) -> Result<CommandOutcome, ManifestError> {
        let bytes = match file {
            Some(path) => std::fs::read(path)?,
            None => {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            }
        };

        let issues = manifest::validate(&bytes, format, root)?;
        if issues.is_empty() {
            Ok(CommandOutcome::Success)
        } else {
            Ok(CommandOutcome::ValidationFailed(issues))
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_writes_manifest_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.txt"), b"hello").unwrap();
        let out = dir.path().join("manifest.xml");

        let command = Commands::Create {
            format: Format::Xml,
            hash_files: vec![Algorithm::GitSha1],
            hash_trees: vec![Algorithm::GitSha1],
            output: Some(out.clone()),
            exclude: Vec::new(),
            skip_unreadable: false,
            paths: vec![dir.path().to_path_buf()],
        };
        let outcome = RunContext::new().execute(&command).unwrap();
        assert!(matches!(outcome, CommandOutcome::Success));

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("<dataset"));
        assert!(written.contains("f.txt"));
        // the output file itself is never part of the manifest
        assert!(!written.contains("manifest.xml"));
    }

    #[test]
    fn test_validate_round_trip_and_tamper() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.txt"), b"hello").unwrap();
        let out = dir.path().join("manifest.yaml");

        let context = RunContext::new();
        context
            .execute(&Commands::Create {
                format: Format::Yaml,
                hash_files: vec![Algorithm::GitSha1],
                hash_trees: vec![Algorithm::GitSha1],
                output: Some(out.clone()),
                exclude: Vec::new(),
                skip_unreadable: false,
                // a lone file argument roots the manifest at the temp dir
                paths: vec![dir.path().join("f.txt")],
            })
            .unwrap();

        let clean = context
            .execute(&Commands::Validate {
                format: Format::Yaml,
                root: dir.path().to_path_buf(),
                file: Some(out.clone()),
            })
            .unwrap();
        assert!(matches!(clean, CommandOutcome::Success));

        fs::write(dir.path().join("f.txt"), b"tampered").unwrap();
        let failed = context
            .execute(&Commands::Validate {
                format: Format::Yaml,
                root: dir.path().to_path_buf(),
                file: Some(out),
            })
            .unwrap();
        let CommandOutcome::ValidationFailed(issues) = failed else {
            panic!("expected validation failure");
        };
        assert!(!issues.is_empty());
    }
}
