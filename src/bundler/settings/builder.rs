//! Builder for constructing Settings.

use super::{AssumeRole, CommitHashFormat, Destination, Settings, Target, Toolchain};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    utils::process::DEFAULT_TOOL_TIMEOUT,
};
use path_absolutize::Absolutize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Executable name used for compiled units unless configured otherwise
pub const DEFAULT_GO_BINARY_NAME: &str = "handler";

/// Builder for constructing [`Settings`].
///
/// Provides a fluent API for building run settings with validation.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_lambda::bundler::{Destination, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_lambda::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .unit_paths(vec!["functions/orders".into(), "functions/billing".into()])
///     .destination(Destination::parse("my-artifacts")?)
///     .staging_dir("/tmp/build")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    unit_paths: Vec<String>,
    destination: Option<Destination>,
    commit_hash_format: CommitHashFormat,
    assume_role: Option<AssumeRole>,
    staging_dir: Option<PathBuf>,
    repo_root: Option<PathBuf>,
    target: Target,
    toolchain: Toolchain,
    go_binary_name: Option<String>,
    tool_timeout: Option<Duration>,
    jobs: Option<usize>,
    dry_run: bool,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the unit paths, relative to the repository root.
    ///
    /// # Required
    ///
    /// At least one path is required for building.
    pub fn unit_paths(mut self, paths: Vec<String>) -> Self {
        self.unit_paths = paths;
        self
    }

    /// Sets the publish destination.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the commit hash format.
    ///
    /// Default: [`CommitHashFormat::Full`]
    pub fn commit_hash_format(mut self, format: CommitHashFormat) -> Self {
        self.commit_hash_format = format;
        self
    }

    /// Assumes `role_arn` in `region` before uploading.
    ///
    /// Default: None (ambient credentials)
    pub fn assume_role(mut self, role_arn: String, region: String) -> Self {
        self.assume_role = Some(AssumeRole { role_arn, region });
        self
    }

    /// Sets the staging directory.
    ///
    /// Default: `<system temp>/build`
    pub fn staging_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staging_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the repository root instead of asking git for it.
    pub fn repo_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.repo_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the compiled-unit target.
    ///
    /// Default: linux/amd64
    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Sets the external program names.
    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Sets the executable name inside compiled code archives.
    ///
    /// Default: `handler`
    pub fn go_binary_name(mut self, name: String) -> Self {
        self.go_binary_name = Some(name);
        self
    }

    /// Sets the per-invocation tool timeout.
    ///
    /// Default: 15 minutes
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Sets the number of units built concurrently.
    ///
    /// Default: number of CPUs
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Skips uploads when set.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required fields are missing or invalid:
    /// - `unit_paths` (at least one)
    /// - `destination`
    /// - `staging_dir` (must not contain `repo_root`)
    pub fn build(self) -> Result<Settings> {
        if self.unit_paths.is_empty() {
            return Err(config("no source directories given"));
        }

        let destination = self
            .destination
            .ok_or_else(|| config("destination bucket is required"))?;

        let go_binary_name = self
            .go_binary_name
            .unwrap_or_else(|| DEFAULT_GO_BINARY_NAME.to_string());
        if go_binary_name.is_empty() || go_binary_name.contains(['/', '\\']) {
            return Err(config(format!("invalid binary name '{go_binary_name}'")));
        }

        let tool_timeout = self.tool_timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT);
        if tool_timeout.is_zero() {
            return Err(config("tool timeout must be greater than zero"));
        }

        let staging_dir = self
            .staging_dir
            .unwrap_or_else(|| std::env::temp_dir().join("build"));
        let staging_dir = staging_dir
            .absolutize()
            .fs_context("resolving staging directory", &staging_dir)?
            .into_owned();

        if let Some(root) = &self.repo_root {
            let root = root
                .absolutize()
                .fs_context("resolving repository root", root)?;
            if root.starts_with(&staging_dir) {
                return Err(config(format!(
                    "repository root {} lies inside staging directory {}",
                    root.display(),
                    staging_dir.display()
                )));
            }
        }

        let jobs = self.jobs.unwrap_or_else(num_cpus::get).max(1);

        Ok(Settings::new(
            self.unit_paths,
            destination,
            self.commit_hash_format,
            self.assume_role,
            staging_dir,
            self.repo_root,
            self.target,
            self.toolchain,
            go_binary_name,
            tool_timeout,
            jobs,
            self.dry_run,
        ))
    }
}

fn config(reason: impl Into<String>) -> Error {
    Error::Config {
        reason: reason.into(),
    }
}
