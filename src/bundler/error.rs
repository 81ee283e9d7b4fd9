//! Error types for detection, build and archiving operations.
//!
//! Every failure carries enough context (program, path, stderr) to be
//! reported to the user without re-running the build.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while classifying, building or archiving a source unit.
#[derive(Error, Debug)]
pub enum Error {
    /// No detection rule matched the directory
    #[error("runtime not supported: no recognized marker file in {}", path.display())]
    UnsupportedRuntime {
        /// Directory that was inspected
        path: PathBuf,
    },

    /// Source directory does not exist or is not a directory
    #[error("source directory not found: {}", path.display())]
    SourceNotFound {
        /// Resolved directory path
        path: PathBuf,
    },

    /// Required input missing or invalid
    #[error("configuration error: {reason}")]
    Config {
        /// What is wrong with the configuration
        reason: String,
    },

    /// External tool is not installed
    #[error("`{program}` not found on PATH: {error}")]
    ToolNotFound {
        /// Program name as requested
        program: String,
        /// Lookup error
        error: which::Error,
    },

    /// External tool could not be spawned or waited on
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Underlying IO error
        error: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("`{command}` failed with exit code {code:?}: {diagnostics}")]
    ToolFailed {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Tool diagnostic output (stderr, or stdout when stderr is empty)
        diagnostics: String,
    },

    /// External tool exceeded the per-invocation timeout
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    ToolTimedOut {
        /// Rendered command line
        command: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// A build step finished but its expected output is absent or empty
    #[error("missing expected output: {}", path.display())]
    MissingOutput {
        /// Path that should have been produced
        path: PathBuf,
    },

    /// Filesystem operation failed on a known path
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        error: std::io::Error,
    },

    /// Archive writer error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal error
    #[error("directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// JSON manifest parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML manifest parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error without path context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Path prefix stripping error
    #[error("path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// True for failures caused by configuration rather than by a unit.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

/// Attaches path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Converts options and foreign errors into [`Error::GenericError`] with a message.
pub trait Context<T> {
    /// Attaches a message.
    fn context<C: Display>(self, message: C) -> Result<T>;

    /// Attaches a lazily built message.
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, message: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(message.to_string()))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, message: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{message}: {e}")))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)).into())
    };
}
