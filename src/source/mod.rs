//! Source unit resolution.
//!
//! A source unit is one directory of the repository designated for
//! packaging. Units are resolved against the repository root discovered once
//! per run and are immutable afterwards.

use crate::bundler::{
    Runtime,
    error::{Error, ErrorExt, Result},
    runtime,
};
use path_absolutize::Absolutize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// One buildable directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUnit {
    relative_path: String,
    absolute_path: PathBuf,
    base_name: String,
    runtime: Runtime,
}

impl SourceUnit {
    /// Resolves `relative_path` against `repo_root` and classifies it.
    ///
    /// Fails when the directory does not exist or no artifact name can be
    /// derived from it (e.g. the repository root itself given as `.`).
    pub fn resolve(repo_root: &Path, relative_path: &str) -> Result<Self> {
        let joined = repo_root.join(relative_path);
        let absolute_path = joined
            .absolutize()
            .fs_context("resolving source path", &joined)?
            .into_owned();

        if !absolute_path.is_dir() {
            return Err(Error::SourceNotFound {
                path: absolute_path,
            });
        }

        let base_name = absolute_path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                Error::GenericError(format!(
                    "cannot derive an artifact name from '{relative_path}'"
                ))
            })?
            .to_string();

        let runtime = runtime::detect(&absolute_path);

        Ok(Self {
            relative_path: relative_path.to_string(),
            absolute_path,
            base_name,
            runtime,
        })
    }

    /// Path as supplied by the caller, relative to the repository root.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Resolved directory.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Last path segment, used as the artifact stem.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Detected runtime.
    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// Code archive file name (`{baseName}.zip`).
    pub fn code_archive_name(&self) -> String {
        format!("{}.zip", self.base_name)
    }

    /// Layer archive file name (`{baseName}_layer.zip`).
    pub fn layer_archive_name(&self) -> String {
        format!("{}_layer.zip", self.base_name)
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path)
    }
}

/// Splits the caller-supplied unit list: one path per line, trimmed, blank lines dropped.
pub fn parse_unit_paths(input: &str) -> Vec<String> {
    input
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
