//! File system utilities for packaging.
//!
//! Idempotent create/remove helpers plus [`ScopedDir`], a guard that removes
//! an intermediate directory when the build step that owns it ends, whether
//! it succeeded or not.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};

/// Creates all of the directories of the specified path, erasing it first if specified.
pub fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path)?;
    }

    // create_dir_all is already idempotent and safe to race across workers
    std::fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Removes the file if it exists.
pub fn remove_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing file",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Size of a file in bytes, `None` when it does not exist or is not a file.
pub fn file_len(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// Directory removed when the guard is dropped.
#[derive(Debug)]
pub struct ScopedDir {
    path: PathBuf,
}

impl ScopedDir {
    /// Creates (erasing any stale content) a directory owned by the guard.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        create_dir_all(&path, true)?;
        Ok(Self { path })
    }

    /// Guards a directory a tool is about to create.
    ///
    /// Returns `None` when the directory already exists: pre-existing
    /// content belongs to the checkout and is left alone.
    pub fn adopt_if_absent(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if path.exists() {
            log::debug!("{} already exists, not removing after build", path.display());
            None
        } else {
            Some(Self { path })
        }
    }

    /// Guarded path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = remove_dir_all(&self.path) {
            log::warn!("Failed to clean up {}: {}", self.path.display(), e);
        }
    }
}

/// Removes a file a tool writes into the checkout as a side effect
/// (`package-lock.json`), unless it was already there.
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
}

impl ScopedFile {
    /// Guards `path`; `None` when the file already exists.
    pub fn adopt_if_absent(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if path.exists() {
            None
        } else {
            Some(Self { path })
        }
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        if let Err(e) = remove_file(&self.path) {
            log::warn!("Failed to clean up {}: {}", self.path.display(), e);
        }
    }
}
