//! Per-unit staging and strategy dispatch.

use super::report::{Stage, UnitOutcome};
use crate::{
    bundler::{
        Error, Result, Settings,
        strategy::{self, BuildContext},
        utils::{
            fs::{self, ScopedDir},
            process::ToolRunner,
        },
    },
    source::SourceUnit,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Subdirectory of the staging directory holding per-unit work directories
pub const WORK_DIR: &str = ".work";

/// Owns the staging directory and turns units into staged archives.
///
/// The staging directory is shared by all units; every unit only ever
/// touches `{baseName}.zip`, `{baseName}_layer.zip` and `.work/{baseName}/`
/// inside it, so units can be packaged concurrently.
#[derive(Clone)]
pub struct Packager {
    settings: Arc<Settings>,
    tools: Arc<dyn ToolRunner>,
}

impl Packager {
    /// Creates a packager running tools through `tools`.
    pub fn new(settings: Arc<Settings>, tools: Arc<dyn ToolRunner>) -> Self {
        Self { settings, tools }
    }

    /// Creates the staging directory if absent.
    pub fn prepare(&self) -> Result<()> {
        let staging = self.settings.staging_dir();
        fs::create_dir_all(staging, false)?;
        log::debug!("Staging directory {}", staging.display());
        Ok(())
    }

    /// Per-unit intermediate directory, erased before and after the build.
    pub fn work_dir(&self, unit: &SourceUnit) -> PathBuf {
        self.settings
            .staging_dir()
            .join(WORK_DIR)
            .join(unit.base_name())
    }

    /// Staged path of the unit's code archive.
    pub fn code_archive_path(&self, unit: &SourceUnit) -> PathBuf {
        self.settings.staging_dir().join(unit.code_archive_name())
    }

    /// Staged path of the unit's layer archive.
    pub fn layer_archive_path(&self, unit: &SourceUnit) -> PathBuf {
        self.settings.staging_dir().join(unit.layer_archive_name())
    }

    /// Packages one unit.
    ///
    /// Never fails as a whole: an unsupported runtime is a detect failure, a
    /// failed build a build or layer failure, and whatever was staged is
    /// returned alongside.
    pub fn package(&self, unit: Arc<SourceUnit>) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(unit.relative_path());

        if let Err(e) = check_disjoint(self.settings.staging_dir(), unit.absolute_path()) {
            outcome.fail(Stage::Detect, e);
            return outcome;
        }

        let Some(strategy) = strategy::strategy_for(unit.runtime()) else {
            outcome.fail(
                Stage::Detect,
                Error::UnsupportedRuntime {
                    path: unit.absolute_path().to_path_buf(),
                },
            );
            return outcome;
        };

        let code_archive = self.code_archive_path(&unit);
        let layer_archive = self.layer_archive_path(&unit);

        // Leftovers from an earlier run must not be mistaken for fresh output
        let cleared = fs::remove_file(&code_archive).and_then(|()| fs::remove_file(&layer_archive));
        if let Err(e) = cleared {
            outcome.fail(Stage::Build, e);
            return outcome;
        }

        let work_dir = match ScopedDir::create(self.work_dir(&unit)) {
            Ok(dir) => dir,
            Err(e) => {
                outcome.fail(Stage::Build, e);
                return outcome;
            }
        };

        log::info!("Packaging {} as {}", unit, unit.runtime());
        let output = strategy.build(&BuildContext {
            unit: &unit,
            settings: self.settings.as_ref(),
            tools: self.tools.as_ref(),
            work_dir: work_dir.path(),
            code_archive: &code_archive,
            layer_archive: &layer_archive,
        });

        match output.code {
            Ok(artifact) => outcome.artifacts.push(artifact),
            Err(e) => outcome.fail(Stage::Build, e),
        }
        match output.layer {
            Some(Ok(artifact)) => outcome.artifacts.push(artifact),
            Some(Err(e)) => outcome.fail(Stage::Layer, e),
            None => {}
        }

        outcome
    }
}

/// Fails when the staging directory is, contains or lies inside `source`.
///
/// Staging content is erased and overwritten freely, so it must never
/// share a tree with sources.
pub(crate) fn check_disjoint(staging: &Path, source: &Path) -> Result<()> {
    if source.starts_with(staging) || staging.starts_with(source) {
        return Err(Error::Config {
            reason: format!(
                "staging directory {} overlaps source directory {}",
                staging.display(),
                source.display()
            ),
        });
    }
    Ok(())
}
