//! Shared fixtures for integration tests.

#![allow(dead_code)]

use kodegen_bundler_lambda::{
    bundler::{
        CommitHashFormat, Destination, Orchestrator, Result, SettingsBuilder,
        utils::process::{ToolInvocation, ToolOutput, ToolRunner},
    },
    upload::{AmbientCredentials, FsObjectStore, Uploader, VersionControl},
};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tempfile::TempDir;

pub const COMMIT: &str = "9b1e4c2a7d3f6e8b0c5a1d9e2f4b7c6a8d0e3f15";

/// Fake toolchain: produces the files real tools would, fails programs on request.
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<ToolInvocation>>,
    broken: Vec<String>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation of `program` exits with status 1.
    pub fn breaking(mut self, program: &str) -> Self {
        self.broken.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(inv.clone());
        if self.broken.contains(&inv.program) {
            return Ok(ToolOutput {
                stdout: String::new(),
                stderr: format!("{} exploded", inv.program),
                exit_code: Some(1),
            });
        }

        match (inv.program.as_str(), inv.args.first().map(String::as_str)) {
            ("go", Some("build")) => {
                if let Some(out) = inv.arg_after("-o") {
                    write(Path::new(out), "\u{7f}ELF handler");
                }
            }
            ("npm", Some("install")) => write(
                &inv.working_dir.join("node_modules/left-pad/index.js"),
                "module.exports = () => {};\n",
            ),
            ("npm", Some("run")) => write(
                &inv.working_dir.join("dist/index.js"),
                "exports.handler = async () => ({});\n",
            ),
            ("pip", Some("install")) => {
                if let Some(target) = inv.arg_after("-t") {
                    write(&Path::new(target).join("requests/__init__.py"), "\n");
                }
            }
            _ => {
                return Ok(ToolOutput {
                    stdout: String::new(),
                    stderr: format!("unexpected invocation: {inv}"),
                    exit_code: Some(127),
                });
            }
        }
        Ok(ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }
}

/// Fixed repository identity.
pub struct FakeVcs {
    root: PathBuf,
    commit: String,
    lookups: AtomicUsize,
}

impl FakeVcs {
    pub fn new(root: &Path, commit: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            commit: commit.to_string(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl VersionControl for FakeVcs {
    fn repository_root(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn commit_hash(&self, format: CommitHashFormat) -> Result<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(match format {
            CommitHashFormat::Full => self.commit.clone(),
            CommitHashFormat::Short => self.commit[..7].to_string(),
        })
    }
}

/// Repository `monorepo` with a bucket directory and a staging directory.
pub struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("monorepo")).unwrap();
        Self { tmp }
    }

    pub fn file(self, path: &str, contents: &str) -> Self {
        write(&self.repo().join(path), contents);
        self
    }

    pub fn repo(&self) -> PathBuf {
        self.tmp.path().join("monorepo")
    }

    pub fn bucket(&self) -> PathBuf {
        self.tmp.path().join("bucket")
    }

    pub fn staging(&self) -> PathBuf {
        self.tmp.path().join("build")
    }

    pub fn orchestrator(
        &self,
        units: &[&str],
        tools: Arc<FakeTools>,
        vcs: Arc<FakeVcs>,
    ) -> Orchestrator {
        let settings = Arc::new(
            SettingsBuilder::new()
                .unit_paths(units.iter().map(|u| u.to_string()).collect())
                .destination(Destination::Directory(self.bucket()))
                .staging_dir(self.staging())
                .repo_root(self.repo())
                .build()
                .unwrap(),
        );
        let uploader = Uploader::new(
            Arc::new(FsObjectStore::new(self.bucket())),
            vcs,
            Arc::new(AmbientCredentials),
            settings.commit_hash_format(),
        );
        Orchestrator::new(settings, tools, Some(Arc::new(uploader)))
    }
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Entry names of a zip archive.
pub fn zip_entries(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(std::fs::File::open(archive).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}
