//! External tool execution.
//!
//! Build steps never build shell command text and never change the process
//! working directory: each call names its program, arguments, working
//! directory and extra environment explicitly.

use crate::bundler::{
    builder::tool_detection,
    error::{Error, Result},
};
use std::{
    fmt,
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread::JoinHandle,
    time::Duration,
};
use wait_timeout::ChildExt;

/// Default per-invocation timeout (15 minutes)
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(900);

/// A single external tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Working directory for the child process
    pub working_dir: PathBuf,
    /// Environment additions on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl ToolInvocation {
    /// Starts an invocation of `program` in `working_dir`.
    pub fn new(program: impl Into<String>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Appends a path argument.
    pub fn path_arg(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Adds an environment variable for this call only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of the argument following `flag`, if any.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Whether the leading arguments equal `prefix`.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished tool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// True when the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Diagnostic text for error reports: stderr, or stdout when stderr is empty.
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Capability to run external tools.
pub trait ToolRunner: Send + Sync {
    /// Runs the tool to completion and returns its raw output.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;

    /// Runs the tool and turns a non-zero exit into [`Error::ToolFailed`].
    fn run_checked(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let output = self.run(invocation)?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::ToolFailed {
                command: invocation.to_string(),
                code: output.exit_code,
                diagnostics: output.diagnostics(),
            })
        }
    }
}

/// Runs tools as child processes of this process.
#[derive(Clone, Debug)]
pub struct SystemToolRunner {
    timeout: Duration,
}

impl Default for SystemToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl SystemToolRunner {
    /// Creates a runner that kills any tool running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let program = tool_detection::locate(&invocation.program)?;
        let command_line = invocation.to_string();
        log::debug!(
            "Running `{}` in {}",
            command_line,
            invocation.working_dir.display()
        );

        let mut command = Command::new(&program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|error| Error::CommandFailed {
            command: command_line.clone(),
            error,
        })?;

        // Drain both pipes concurrently so a chatty tool cannot block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                log::warn!(
                    "`{}` exceeded {}s, terminating",
                    command_line,
                    self.timeout.as_secs()
                );
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill `{}`: {}", command_line, e);
                }
                let _ = child.wait();
                return Err(Error::ToolTimedOut {
                    command: command_line,
                    timeout: self.timeout,
                });
            }
            Err(error) => {
                return Err(Error::CommandFailed {
                    command: command_line,
                    error,
                });
            }
        };

        let output = ToolOutput {
            stdout: collect(stdout),
            stderr: collect(stderr),
            exit_code: status.code(),
        };

        if !output.stdout.is_empty() {
            log::trace!("`{}` stdout:\n{}", command_line, output.stdout);
        }
        if !output.stderr.is_empty() {
            log::trace!("`{}` stderr:\n{}", command_line, output.stderr);
        }

        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
