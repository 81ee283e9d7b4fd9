//! Dependency manifest inspection.
//!
//! Reads the manifests a build strategy needs to decide what to run:
//! `package.json` (declared build step, production dependencies),
//! `tsconfig.json` (compiled output directory), `requirements.txt` and
//! `Pipfile` (whether any dependency is declared at all).

use crate::bundler::error::{ErrorExt, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Output directory used when `tsconfig.json` does not name one
pub const DEFAULT_TS_OUT_DIR: &str = "dist";

/// Subset of `package.json` relevant for packaging.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,

    /// npm scripts
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    /// Production dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    /// Whether a `build` script is declared.
    pub fn has_build_script(&self) -> bool {
        self.scripts
            .get("build")
            .is_some_and(|script| !script.trim().is_empty())
    }

    /// Whether at least one production dependency is declared.
    pub fn has_production_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

/// Loads `package.json` from `unit_dir`, `None` when absent.
pub fn load_package_manifest(unit_dir: &Path) -> Result<Option<PackageManifest>> {
    let path = unit_dir.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).fs_context("reading package.json", &path)?;
    let manifest = serde_json::from_str(&content)?;
    Ok(Some(manifest))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: TsCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsCompilerOptions {
    #[serde(default)]
    out_dir: Option<String>,
}

/// Directory the TypeScript compiler writes to, relative to `unit_dir`.
///
/// Falls back to [`DEFAULT_TS_OUT_DIR`] when `tsconfig.json` is missing,
/// names no `outDir`, or is not plain JSON (comments, trailing commas).
pub fn typescript_out_dir(unit_dir: &Path) -> PathBuf {
    let path = unit_dir.join("tsconfig.json");
    let out_dir = std::fs::read_to_string(&path)
        .ok()
        .and_then(|content| match serde_json::from_str::<TsConfig>(&content) {
            Ok(config) => config.compiler_options.out_dir,
            Err(e) => {
                log::warn!(
                    "Could not parse {} ({}), assuming outDir \"{}\"",
                    path.display(),
                    e,
                    DEFAULT_TS_OUT_DIR
                );
                None
            }
        })
        .unwrap_or_else(|| DEFAULT_TS_OUT_DIR.to_string());

    unit_dir.join(out_dir.trim_start_matches("./"))
}

/// pip options that configure where packages come from without requiring any.
const INDEX_OPTIONS: &[&str] = &["-i", "--index-url", "--extra-index-url", "--trusted-host"];

/// Whether a pip requirements file lists at least one requirement.
///
/// Comments, blank lines and index options do not count.
pub fn requirements_declared(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path).fs_context("reading requirements", path)?;
    Ok(content.lines().any(|line| {
        let line = line.trim();
        !line.is_empty()
            && !line.starts_with('#')
            && !INDEX_OPTIONS.iter().any(|opt| {
                line.strip_prefix(opt)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '=']))
            })
    }))
}

/// Whether a `Pipfile` declares any runtime package.
pub fn pipfile_declares_packages(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path).fs_context("reading Pipfile", path)?;
    let pipfile: toml::Table = toml::from_str(&content)?;
    Ok(pipfile
        .get("packages")
        .and_then(|packages| packages.as_table())
        .is_some_and(|packages| !packages.is_empty()))
}
