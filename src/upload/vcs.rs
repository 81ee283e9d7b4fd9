//! Repository identity from version control.

use crate::bundler::{
    CommitHashFormat, Error, Result,
    utils::process::{ToolInvocation, ToolRunner},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Source of the repository root, name and current commit.
pub trait VersionControl: Send + Sync {
    /// Top-level directory of the checkout.
    fn repository_root(&self) -> Result<PathBuf>;

    /// Repository name, the last segment of the root by default.
    fn repository_name(&self) -> Result<String> {
        let root = self.repository_root()?;
        root.file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                Error::GenericError(format!(
                    "cannot derive a repository name from {}",
                    root.display()
                ))
            })
    }

    /// Hash of the checked-out commit.
    fn commit_hash(&self, format: CommitHashFormat) -> Result<String>;
}

/// [`VersionControl`] backed by the `git` command line.
pub struct GitCli {
    tools: Arc<dyn ToolRunner>,
    program: String,
    dir: PathBuf,
}

impl GitCli {
    /// Queries the repository containing `dir` with `program` (usually `git`).
    pub fn new(
        tools: Arc<dyn ToolRunner>,
        program: impl Into<String>,
        dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            tools,
            program: program.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn query(&self, args: &[&str]) -> Result<String> {
        let output = self
            .tools
            .run_checked(&ToolInvocation::new(&self.program, &self.dir).args(args))?;
        let value = output.stdout.trim();
        if value.is_empty() {
            crate::bail!("`{} {}` printed nothing", self.program, args.join(" "));
        }
        Ok(value.to_string())
    }
}

impl VersionControl for GitCli {
    fn repository_root(&self) -> Result<PathBuf> {
        self.query(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    fn commit_hash(&self, format: CommitHashFormat) -> Result<String> {
        let format_arg = format!("--format=format:{}", format.git_placeholder());
        self.query(&["log", "-1", &format_arg])
    }
}
