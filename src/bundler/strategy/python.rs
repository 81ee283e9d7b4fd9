//! Interpreted units with a dependency manifest (Python).
//!
//! Code is `src/` archived verbatim. Dependencies are installed with pip into
//! `<work>/layer/python` and archived under `python/`, the directory the
//! runtime adds to its import path.

use super::{BuildContext, BuildStrategy};
use crate::{
    bundler::{
        Result, Runtime,
        error::ErrorExt,
        utils::{archive, fs::ScopedDir, process::ToolInvocation},
    },
    metadata,
};
use std::path::PathBuf;

/// Layer root recognized by the Python runtime
const LAYER_ROOT: &str = "python";

/// Archives `src/` and pip-installs declared requirements into a layer.
#[derive(Debug, Default)]
pub struct PythonStrategy;

impl PythonStrategy {
    /// Requirements file to install from, `None` when nothing is declared.
    ///
    /// A `Pipfile` wins over `requirements.txt`; its requirements are
    /// exported with `pipenv requirements` into the work directory.
    fn requirements(&self, ctx: &BuildContext<'_>) -> Result<Option<PathBuf>> {
        let unit_dir = ctx.unit_dir();

        let pipfile = unit_dir.join("Pipfile");
        if pipfile.is_file() {
            if !metadata::pipfile_declares_packages(&pipfile)? {
                return Ok(None);
            }

            let output = ctx.tools.run_checked(
                &ToolInvocation::new(&ctx.settings.toolchain().pipenv, unit_dir)
                    .arg("requirements"),
            )?;
            let exported = ctx.work_dir.join("requirements.txt");
            std::fs::write(&exported, output.stdout)
                .fs_context("writing exported requirements", &exported)?;
            return Ok(metadata::requirements_declared(&exported)?.then_some(exported));
        }

        let requirements = unit_dir.join("requirements.txt");
        if requirements.is_file() && metadata::requirements_declared(&requirements)? {
            return Ok(Some(requirements));
        }
        Ok(None)
    }
}

impl BuildStrategy for PythonStrategy {
    fn runtime(&self) -> Runtime {
        Runtime::InterpretedWithManifest
    }

    fn build_code(&self, ctx: &BuildContext<'_>) -> Result<()> {
        archive::zip_directory(&ctx.unit_dir().join("src"), "", ctx.code_archive)?;
        Ok(())
    }

    fn build_layer(&self, ctx: &BuildContext<'_>) -> Result<bool> {
        let Some(requirements) = self.requirements(ctx)? else {
            return Ok(false);
        };

        let layer = ScopedDir::create(ctx.work_dir.join("layer"))?;
        let target = layer.path().join(LAYER_ROOT);

        log::info!("Installing Python dependencies for {}", ctx.unit);
        ctx.tools.run_checked(
            &ToolInvocation::new(&ctx.settings.toolchain().pip, ctx.unit_dir())
                .args(["install", "--disable-pip-version-check", "--no-input", "-r"])
                .path_arg(&requirements)
                .arg("-t")
                .path_arg(&target),
        )?;

        archive::zip_directory(&target, LAYER_ROOT, ctx.layer_archive)?;
        Ok(true)
    }
}
