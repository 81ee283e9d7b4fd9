//! Core Settings struct and implementations.

use super::{AssumeRole, CommitHashFormat, Destination, Target};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Program names for the external toolchains.
///
/// Overridable so CI images shipping `pip3` or a pinned `go` path work
/// without PATH tricks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Toolchain {
    /// Go compiler
    pub go: String,
    /// pip installer
    pub pip: String,
    /// pipenv (Pipfile projects)
    pub pipenv: String,
    /// npm
    pub npm: String,
    /// AWS CLI
    pub aws: String,
    /// git
    pub git: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            pip: "pip".to_string(),
            pipenv: "pipenv".to_string(),
            npm: "npm".to_string(),
            aws: "aws".to_string(),
            git: "git".to_string(),
        }
    }
}

/// Main settings for a packaging run.
///
/// Constructed and validated via [`SettingsBuilder`](super::SettingsBuilder);
/// immutable for the rest of the run.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Unit paths relative to the repository root, in input order.
    unit_paths: Vec<String>,

    /// Where artifacts are published.
    destination: Destination,

    /// Full or abbreviated commit hash in storage keys.
    commit_hash_format: CommitHashFormat,

    /// Role assumed before uploading, if any.
    assume_role: Option<AssumeRole>,

    /// Absolute staging directory shared by all units.
    staging_dir: PathBuf,

    /// Repository root; discovered through git when `None`.
    repo_root: Option<PathBuf>,

    /// Compiled-unit target.
    target: Target,

    /// External program names.
    toolchain: Toolchain,

    /// File name of the compiled executable inside the code archive.
    go_binary_name: String,

    /// Per external tool invocation.
    tool_timeout: Duration,

    /// Units built concurrently.
    jobs: usize,

    /// Build and stage only; skip uploads.
    dry_run: bool,
}

impl Settings {
    /// Unit paths in input order.
    pub fn unit_paths(&self) -> &[String] {
        &self.unit_paths
    }

    /// Publish destination.
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Commit hash format for storage keys.
    pub fn commit_hash_format(&self) -> CommitHashFormat {
        self.commit_hash_format
    }

    /// Role to assume before uploading.
    pub fn assume_role(&self) -> Option<&AssumeRole> {
        self.assume_role.as_ref()
    }

    /// Staging directory for archives and per-unit work directories.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Explicit repository root, if configured.
    pub fn repo_root(&self) -> Option<&Path> {
        self.repo_root.as_deref()
    }

    /// Compiled-unit target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// External program names.
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Executable name inside compiled code archives.
    pub fn go_binary_name(&self) -> &str {
        &self.go_binary_name
    }

    /// Timeout applied to each external tool invocation.
    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    /// Maximum number of units built at once.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Whether uploads are skipped.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        unit_paths: Vec<String>,
        destination: Destination,
        commit_hash_format: CommitHashFormat,
        assume_role: Option<AssumeRole>,
        staging_dir: PathBuf,
        repo_root: Option<PathBuf>,
        target: Target,
        toolchain: Toolchain,
        go_binary_name: String,
        tool_timeout: Duration,
        jobs: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            unit_paths,
            destination,
            commit_hash_format,
            assume_role,
            staging_dir,
            repo_root,
            target,
            toolchain,
            go_binary_name,
            tool_timeout,
            jobs,
            dry_run,
        }
    }
}
