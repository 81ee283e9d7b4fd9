//! Top-level error types for the command line.
//!
//! Pipeline failures of individual units are never errors at this level;
//! they are collected into a [`RunReport`](crate::bundler::RunReport). What
//! remains here stops the run before or outside unit processing.

use thiserror::Error;

/// Result type alias for command line operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Exit code of a run where every stage succeeded
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a run with at least one stage failure
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration failures (nothing was processed)
pub const EXIT_CONFIGURATION: i32 = 2;

/// Main error type for command line operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Build and packaging errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Publishing errors
    #[error("Upload error: {0}")]
    Upload(#[from] crate::upload::UploadError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Repository root could not be determined
    #[error("Cannot determine repository root: {reason}")]
    RepositoryRoot {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Whether this error stems from configuration rather than execution.
    pub fn is_configuration(&self) -> bool {
        match self {
            BundlerError::Cli(_) => true,
            BundlerError::Bundler(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            EXIT_CONFIGURATION
        } else {
            EXIT_FAILURE
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Cli(CliError::MissingArgument { argument }) => vec![format!(
                "Pass --{argument} or set the matching INPUT_* environment variable"
            )],
            BundlerError::Cli(CliError::RepositoryRoot { .. }) => vec![
                "Run from inside a git checkout".to_string(),
                "Or pass --repo-root explicitly".to_string(),
            ],
            BundlerError::Cli(CliError::InvalidArguments { .. }) => {
                vec!["Run with --help to see accepted values".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
