//! Upload error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;

/// Failure to publish one artifact.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Staged file exists but holds no data
    #[error("artifact {} is empty", path.display())]
    EmptyArtifact {
        /// Staged file
        path: PathBuf,
    },

    /// Repository name or commit could not be determined
    #[error("cannot resolve repository identity: {reason}")]
    Identity {
        /// Underlying failure
        reason: String,
    },

    /// Credentials could not be acquired
    #[error("credential acquisition failed: {reason}")]
    Credentials {
        /// Underlying failure
        reason: String,
    },

    /// Storage client rejected or failed the put
    #[error("put {key} failed: {source}")]
    Store {
        /// Storage key being written
        key: String,
        /// Storage client error
        source: crate::bundler::Error,
    },

    /// Unexpected response from a collaborator
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    /// Local filesystem or tool error
    #[error(transparent)]
    Bundler(#[from] crate::bundler::Error),
}
