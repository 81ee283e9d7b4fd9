//! Artifact checksum calculation.
//!
//! Staged archives are summarised with a SHA-256 digest and size before they
//! are uploaded (and deleted), so the run report can still name them.

use crate::bundler::{Result, error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Calculates the SHA-256 checksum and size of a file.
///
/// Reads in 8KB chunks.
///
/// # Arguments
///
/// * `path` - File to hash
///
/// # Returns
///
/// * `Ok((String, u64))` - Hex-encoded SHA-256 hash (64 characters) and size in bytes
/// * `Err` - If the file cannot be read
pub async fn calculate_sha256(path: &Path) -> Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];
    let mut size = 0u64;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        size += n as u64;
    }

    Ok((format!("{:x}", hasher.finalize()), size))
}
