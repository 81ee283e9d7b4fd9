//! Deterministic zip archive creation.
//!
//! Entries are written in sorted order with a fixed timestamp and normalised
//! permissions, so an unchanged tree always produces the same bytes.
//! Archives are written to a sibling `.part` file and renamed into place:
//! the destination either does not exist or is complete.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

const FILE_MODE: u32 = 0o644;
const EXEC_MODE: u32 = 0o755;

fn options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(mode)
}

/// Archives every file under `src_dir`, placing entries below `prefix`.
///
/// An empty `prefix` puts the directory's contents at the archive root.
/// Symlinks are followed. Returns the number of file entries written.
/// Fails with [`Error::MissingOutput`] when `src_dir` is missing or holds no files.
pub fn zip_directory(src_dir: &Path, prefix: &str, dest: &Path) -> Result<usize> {
    if !src_dir.is_dir() {
        return Err(Error::MissingOutput {
            path: src_dir.to_path_buf(),
        });
    }

    let entries = WalkDir::new(src_dir)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let prefix = prefix.trim_matches('/');
    let files = write_archive(dest, |zip| {
        let mut files = 0;

        // Layer layouts need their root directories as explicit entries
        let mut parent = String::new();
        for component in prefix.split('/').filter(|c| !c.is_empty()) {
            parent.push_str(component);
            parent.push('/');
            zip.add_directory(parent.clone(), options(EXEC_MODE))?;
        }

        for entry in &entries {
            let rel = entry.path().strip_prefix(src_dir)?;
            let name = entry_name(prefix, rel);

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{name}/"), options(EXEC_MODE))?;
            } else {
                let mode = if is_executable(entry.path()) {
                    EXEC_MODE
                } else {
                    FILE_MODE
                };
                zip.start_file(name, options(mode))?;
                let mut file = File::open(entry.path()).fs_context("opening file", entry.path())?;
                io::copy(&mut file, zip).fs_context("archiving file", entry.path())?;
                files += 1;
            }
        }

        Ok(files)
    })?;

    if files == 0 {
        super::fs::remove_file(dest)?;
        return Err(Error::MissingOutput {
            path: src_dir.to_path_buf(),
        });
    }

    log::debug!(
        "Archived {} file(s) from {} into {}",
        files,
        src_dir.display(),
        dest.display()
    );
    Ok(files)
}

/// Archives a single file as the executable entry `entry_name`.
pub fn zip_executable(file: &Path, entry_name: &str, dest: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(Error::MissingOutput {
            path: file.to_path_buf(),
        });
    }

    write_archive(dest, |zip| {
        zip.start_file(entry_name, options(EXEC_MODE))?;
        let mut input = File::open(file).fs_context("opening file", file)?;
        io::copy(&mut input, zip).fs_context("archiving file", file)?;
        Ok(())
    })?;

    log::debug!("Archived {} into {}", file.display(), dest.display());
    Ok(())
}

fn write_archive<T>(
    dest: &Path,
    fill: impl FnOnce(&mut ZipWriter<File>) -> Result<T>,
) -> Result<T> {
    let part = part_path(dest);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).fs_context("creating archive directory", parent)?;
    }

    let result = (|| -> Result<T> {
        let file = File::create(&part).fs_context("creating archive", &part)?;
        let mut zip = ZipWriter::new(file);
        let value = fill(&mut zip)?;
        zip.finish()?;
        Ok(value)
    })();

    match result {
        Ok(value) => {
            std::fs::rename(&part, dest).fs_context("finalizing archive", dest)?;
            Ok(value)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&part);
            Err(e)
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn entry_name(prefix: &str, rel: &Path) -> String {
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if prefix.is_empty() {
        rel
    } else {
        format!("{prefix}/{rel}")
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}
