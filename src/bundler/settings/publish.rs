//! Where and under which identity artifacts are published.

use crate::bundler::error::{Error, Result};
use std::path::PathBuf;

/// Object storage destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Destination {
    /// S3 bucket name
    S3 {
        /// Bucket name without scheme
        bucket: String,
    },
    /// Local directory standing in for a bucket (`file://` destinations)
    Directory(PathBuf),
}

impl Destination {
    /// Parses a bucket identifier.
    ///
    /// Accepts `bucket`, `s3://bucket` and `file:///some/dir`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Some(dir) = value.strip_prefix("file://") {
            if dir.is_empty() {
                return Err(Error::Config {
                    reason: "file:// destination needs a directory".to_string(),
                });
            }
            return Ok(Self::Directory(PathBuf::from(dir)));
        }

        let bucket = value.strip_prefix("s3://").unwrap_or(value).trim_end_matches('/');
        if bucket.is_empty() {
            return Err(Error::Config {
                reason: "destination bucket is required".to_string(),
            });
        }
        if bucket.contains('/') || bucket.contains(char::is_whitespace) {
            return Err(Error::Config {
                reason: format!("invalid bucket name '{bucket}'"),
            });
        }

        Ok(Self::S3 {
            bucket: bucket.to_string(),
        })
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::S3 { bucket } => write!(f, "s3://{bucket}"),
            Destination::Directory(dir) => write!(f, "file://{}", dir.display()),
        }
    }
}

/// Commit hash rendering used in storage keys.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CommitHashFormat {
    /// Full 40-character hash
    #[default]
    Full,
    /// Abbreviated hash as printed by `git log --format=%h`
    Short,
}

impl CommitHashFormat {
    /// `git log --format` placeholder for this format.
    pub fn git_placeholder(&self) -> &'static str {
        match self {
            CommitHashFormat::Full => "%H",
            CommitHashFormat::Short => "%h",
        }
    }
}

/// Role to assume before uploading.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssumeRole {
    /// Role ARN
    pub role_arn: String,
    /// Region for STS and the upload
    pub region: String,
}
