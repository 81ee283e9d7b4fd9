//! Test doubles for code that shells out to toolchains.
//!
//! [`ScriptedTools`] records every invocation and imitates go, pip, pipenv,
//! npm, git and the AWS CLI by writing the files those tools would produce,
//! so strategies and uploaders run end to end without real toolchains.

use super::process::{ToolInvocation, ToolOutput, ToolRunner};
use crate::{
    bundler::{
        Destination, Result, Settings, SettingsBuilder, builder::WORK_DIR, strategy::BuildContext,
    },
    source::SourceUnit,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

/// Full commit hash reported by the fake `git log`.
pub const FULL_HASH: &str = "3f2a9c1d8e7b6a5f4e3d2c1b0a9f8e7d6c5b4a39";

/// Abbreviated commit hash reported by the fake `git log`.
pub const SHORT_HASH: &str = "3f2a9c1";

type Hook = Box<dyn Fn(&ToolInvocation) -> Option<ToolOutput> + Send + Sync>;

/// Fake [`ToolRunner`] with scripted per-tool behaviour.
#[derive(Default)]
pub struct ScriptedTools {
    calls: Mutex<Vec<ToolInvocation>>,
    hooks: Vec<Hook>,
}

impl ScriptedTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default behaviour wherever `hook` returns `Some`.
    pub fn with_hook(
        mut self,
        hook: impl Fn(&ToolInvocation) -> Option<ToolOutput> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Makes every call whose program is `program` and whose arguments start
    /// with `prefix` exit with status 1.
    pub fn failing(
        self,
        program: &'static str,
        prefix: &'static [&'static str],
        stderr: &'static str,
    ) -> Self {
        self.with_hook(move |inv| {
            (inv.program == program && inv.starts_with(prefix)).then(|| failure(stderr))
        })
    }

    /// Every invocation so far, in call order.
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of `program` so far.
    pub fn calls_to(&self, program: &str) -> Vec<ToolInvocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program == program)
            .collect()
    }
}

impl ToolRunner for ScriptedTools {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        for hook in &self.hooks {
            if let Some(output) = hook(invocation) {
                return Ok(output);
            }
        }
        Ok(simulate(invocation))
    }
}

/// Successful exit with `stdout`.
pub fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

/// Exit status 1 with `stderr`.
pub fn failure(stderr: &str) -> ToolOutput {
    ToolOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(1),
    }
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn simulate(inv: &ToolInvocation) -> ToolOutput {
    let cwd = &inv.working_dir;
    match inv.program.as_str() {
        "go" if inv.starts_with(&["build"]) => {
            if let Some(out) = inv.arg_after("-o") {
                write(Path::new(out), "\u{7f}ELF fake handler");
            }
            ok("")
        }
        "pip" if inv.starts_with(&["install"]) => {
            if let Some(target) = inv.arg_after("-t") {
                write(&Path::new(target).join("requests/__init__.py"), "# requests\n");
            }
            ok("")
        }
        "pipenv" if inv.starts_with(&["requirements"]) => {
            ok("-i https://pypi.org/simple\nrequests==2.31.0\n")
        }
        "npm" if inv.starts_with(&["run", "build"]) => {
            write(
                &cwd.join("dist/index.js"),
                "exports.handler = async () => ({ statusCode: 200 });\n",
            );
            ok("")
        }
        "npm" if inv.starts_with(&["install"]) => {
            write(
                &cwd.join("node_modules/left-pad/index.js"),
                "module.exports = () => {};\n",
            );
            ok("")
        }
        "git" if inv.starts_with(&["rev-parse", "--show-toplevel"]) => {
            ok(&format!("{}\n", cwd.display()))
        }
        "git" if inv.starts_with(&["log"]) => {
            if inv.args.iter().any(|a| a.ends_with("%h")) {
                ok(SHORT_HASH)
            } else {
                ok(FULL_HASH)
            }
        }
        "aws" if inv.starts_with(&["s3api", "put-object"]) => {
            ok("{\"ETag\": \"\\\"d41d8cd98f00\\\"\"}\n")
        }
        "aws" if inv.starts_with(&["sts", "assume-role"]) => ok(r#"{
  "Credentials": {
    "AccessKeyId": "ASIAEXAMPLE",
    "SecretAccessKey": "secret-example",
    "SessionToken": "token-example",
    "Expiration": "2026-10-19T12:00:00Z"
  },
  "AssumedRoleUser": {
    "AssumedRoleId": "AROAEXAMPLE:lambda-packager",
    "Arn": "arn:aws:sts::123456789012:assumed-role/deploy/lambda-packager"
  }
}
"#),
        _ => failure(&format!("unexpected invocation: {inv}")),
    }
}

/// A single unit inside a throwaway repository, with its staging paths.
pub struct UnitFixture {
    pub repo: TempDir,
    pub staging: TempDir,
    pub unit: Arc<SourceUnit>,
    pub settings: Settings,
    pub work_dir: PathBuf,
    pub code_archive: PathBuf,
    pub layer_archive: PathBuf,
}

impl UnitFixture {
    /// Creates unit `name` containing `files` (relative path, contents).
    pub fn new(name: &str, files: &[(&str, &str)]) -> Self {
        let repo = TempDir::new().unwrap();
        for (path, contents) in files {
            write(&repo.path().join(name).join(path), contents);
        }
        std::fs::create_dir_all(repo.path().join(name)).unwrap();

        let staging = TempDir::new().unwrap();
        let settings = SettingsBuilder::new()
            .unit_paths(vec![name.to_string()])
            .destination(Destination::S3 {
                bucket: "artifacts".into(),
            })
            .staging_dir(staging.path())
            .repo_root(repo.path())
            .build()
            .unwrap();

        let unit = Arc::new(SourceUnit::resolve(repo.path(), name).unwrap());
        let work_dir = staging.path().join(WORK_DIR).join(unit.base_name());
        std::fs::create_dir_all(&work_dir).unwrap();
        let code_archive = staging.path().join(unit.code_archive_name());
        let layer_archive = staging.path().join(unit.layer_archive_name());

        Self {
            repo,
            staging,
            unit,
            settings,
            work_dir,
            code_archive,
            layer_archive,
        }
    }

    /// Build context running tools through `tools`.
    pub fn context<'a>(&'a self, tools: &'a dyn ToolRunner) -> BuildContext<'a> {
        BuildContext {
            unit: &self.unit,
            settings: &self.settings,
            tools,
            work_dir: &self.work_dir,
            code_archive: &self.code_archive,
            layer_archive: &self.layer_archive,
        }
    }

    /// Source directory of the unit.
    pub fn unit_dir(&self) -> &Path {
        self.unit.absolute_path()
    }
}

/// Entry names of a zip archive, in archive order.
pub fn zip_entries(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(std::fs::File::open(archive).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}
