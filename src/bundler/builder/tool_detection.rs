//! External tool detection and availability checking.
//!
//! Lookups are cached for the lifetime of the process to avoid repeated PATH
//! scans when many units invoke the same toolchain.

use crate::bundler::error::{Error, Result};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

static RESOLVED: LazyLock<Mutex<HashMap<String, PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Resolves `program` to an executable path.
///
/// Accepts bare names (searched on `PATH`) and explicit paths.
pub fn locate(program: &str) -> Result<PathBuf> {
    if let Some(path) = RESOLVED.lock().ok().and_then(|m| m.get(program).cloned()) {
        return Ok(path);
    }

    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program, path.display());
            if let Ok(mut cache) = RESOLVED.lock() {
                cache.insert(program.to_string(), path.clone());
            }
            Ok(path)
        }
        Err(error) => {
            log::debug!("{} not found in PATH: {}", program, error);
            Err(Error::ToolNotFound {
                program: program.to_string(),
                error,
            })
        }
    }
}

/// Whether `program` can be located.
pub fn is_available(program: &str) -> bool {
    locate(program).is_ok()
}

/// Logs a warning for every tool in `programs` that is not installed.
///
/// Units needing a missing tool still fail individually when they run.
pub fn warn_missing<'a>(programs: impl IntoIterator<Item = &'a str>) {
    for program in programs {
        if !is_available(program) {
            log::warn!(
                "{} not found in PATH - units that need it will fail to build",
                program
            );
        }
    }
}
