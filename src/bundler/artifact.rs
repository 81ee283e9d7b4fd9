//! Files produced by build strategies.

use crate::source::SourceUnit;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// What an archive contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Runnable source or executable
    Code,
    /// External dependencies in the runtime's layer layout
    Layer,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Code => f.write_str("code"),
            ArtifactKind::Layer => f.write_str("layer"),
        }
    }
}

/// A staged archive waiting for upload.
///
/// Not `Clone`: uploading consumes the artifact and deletes its file.
#[derive(Debug, PartialEq, Eq)]
pub struct BuildArtifact {
    kind: ArtifactKind,
    local_path: PathBuf,
    unit: Arc<SourceUnit>,
}

impl BuildArtifact {
    /// Wraps a staged archive produced for `unit`.
    pub fn new(kind: ArtifactKind, local_path: impl Into<PathBuf>, unit: Arc<SourceUnit>) -> Self {
        Self {
            kind,
            local_path: local_path.into(),
            unit,
        }
    }

    /// Code or layer archive.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Absolute path inside the staging directory.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Unit that produced the archive.
    pub fn unit(&self) -> &SourceUnit {
        &self.unit
    }

    /// Archive file name, the last segment of the storage key.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for BuildArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.file_name(), self.unit, self.kind)
    }
}

/// Summary of a staged archive, kept for the run report after the file
/// itself has been uploaded and removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Unit path as given by the caller
    pub unit: String,
    /// Code or layer
    pub kind: ArtifactKind,
    /// Archive file name
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive
    pub checksum: String,
    /// Storage key once uploaded
    pub key: Option<String>,
}
