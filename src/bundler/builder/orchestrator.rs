//! Run orchestration.
//!
//! This module provides the [`Orchestrator`] that drives a whole run:
//! resolve every unit, package them concurrently, then publish every staged
//! archive, collecting failures instead of stopping at the first one.

use super::{
    checksum::calculate_sha256,
    packager::Packager,
    report::{PipelineState, RunReport, Stage, UnitOutcome},
};
use crate::{
    bundler::{BuildArtifact, Error, Result, Settings, StagedArtifact, utils::process::ToolRunner},
    source::SourceUnit,
    upload::Uploader,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};

/// Main pipeline orchestrator.
///
/// Moves through `Idle -> Building -> Uploading -> Done | Failed`. Every
/// unit is attempted; artifacts of partially failed units are still
/// uploaded.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_lambda::bundler::{Orchestrator, Settings};
/// use kodegen_bundler_lambda::bundler::utils::process::SystemToolRunner;
/// use std::sync::Arc;
///
/// # async fn example(settings: Settings) -> kodegen_bundler_lambda::bundler::Result<()> {
/// let tools = Arc::new(SystemToolRunner::new(settings.tool_timeout()));
/// // Without an uploader the run stops after staging
/// let orchestrator = Orchestrator::new(Arc::new(settings), tools, None);
/// let report = orchestrator.run(std::path::Path::new(".")).await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    settings: Arc<Settings>,
    packager: Packager,
    uploader: Option<Arc<Uploader>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("uploader", &self.uploader)
            .finish()
    }
}

impl Orchestrator {
    /// Creates an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated run settings
    /// * `tools` - External tool capability shared by all builds
    /// * `uploader` - Publisher for staged archives; `None` stages only
    pub fn new(
        settings: Arc<Settings>,
        tools: Arc<dyn ToolRunner>,
        uploader: Option<Arc<Uploader>>,
    ) -> Self {
        let packager = Packager::new(Arc::clone(&settings), tools);
        Self {
            settings,
            packager,
            uploader,
        }
    }

    /// Returns a reference to the run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the pipeline for every configured unit.
    ///
    /// # Arguments
    ///
    /// * `repo_root` - Repository root unit paths are resolved against
    ///
    /// # Returns
    ///
    /// The [`RunReport`] in state `Done` or `Failed`. Unit failures are part
    /// of the report; `Err` is reserved for failures that prevent any unit
    /// from being processed (the staging directory cannot be created or
    /// would contain the repository).
    pub async fn run(&self, repo_root: &Path) -> Result<RunReport> {
        let staging = self.settings.staging_dir();
        if repo_root.starts_with(staging) {
            return Err(Error::Config {
                reason: format!(
                    "repository root {} lies inside staging directory {}",
                    repo_root.display(),
                    staging.display()
                ),
            });
        }

        let mut report = RunReport::default();
        report.transition(PipelineState::Building);

        self.packager.prepare()?;

        let outcomes = self.build_all(repo_root).await;

        let mut pending = Vec::new();
        for outcome in outcomes {
            report.failures.extend(outcome.failures);
            pending.extend(outcome.artifacts);
        }

        report.transition(PipelineState::Uploading);
        for artifact in pending {
            self.publish(artifact, &mut report).await;
        }

        report.finish();
        Ok(report)
    }

    /// Resolves and packages all units, returning outcomes in input order.
    async fn build_all(&self, repo_root: &Path) -> Vec<UnitOutcome> {
        let paths = self.settings.unit_paths();
        let mut outcomes: Vec<Option<UnitOutcome>> = paths.iter().map(|_| None).collect();
        let mut archive_names: HashMap<String, &str> = HashMap::new();

        let semaphore = Arc::new(Semaphore::new(self.settings.jobs()));
        let mut tasks = JoinSet::new();

        for (index, path) in paths.iter().enumerate() {
            let unit = match SourceUnit::resolve(repo_root, path) {
                Ok(unit) => unit,
                Err(e) => {
                    let mut outcome = UnitOutcome::new(path.as_str());
                    outcome.fail(Stage::Detect, e);
                    outcomes[index] = Some(outcome);
                    continue;
                }
            };

            // A unit reserves both archive names, built or not
            let names = [unit.code_archive_name(), unit.layer_archive_name()];
            if let Some((name, first)) = names
                .iter()
                .find_map(|n| archive_names.get(n).map(|first| (n, *first)))
            {
                let mut outcome = UnitOutcome::new(path.as_str());
                outcome.fail(
                    Stage::Detect,
                    format!("archive name '{name}' is already used by {first}"),
                );
                outcomes[index] = Some(outcome);
                continue;
            }
            for name in names {
                archive_names.insert(name, path.as_str());
            }

            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            let packager = self.packager.clone();
            let unit = Arc::new(unit);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, packager.package(unit))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => log::error!("Build task did not complete: {}", e),
            }
        }

        outcomes
            .into_iter()
            .zip(paths)
            .map(|(outcome, path)| {
                outcome.unwrap_or_else(|| {
                    let mut outcome = UnitOutcome::new(path.as_str());
                    outcome.fail(Stage::Build, "build task did not complete");
                    outcome
                })
            })
            .collect()
    }

    /// Records, checksums and uploads one staged archive.
    async fn publish(&self, artifact: BuildArtifact, report: &mut RunReport) {
        let unit = artifact.unit().relative_path().to_string();
        let file_name = artifact.file_name();

        let (checksum, size) = match calculate_sha256(artifact.local_path()).await {
            Ok(summary) => summary,
            Err(e) => {
                report.failures.push(failure(&unit, &file_name, e));
                return;
            }
        };
        log::info!("{} ({} bytes, sha256 {})", file_name, size, checksum);

        let mut staged = StagedArtifact {
            unit: unit.clone(),
            kind: artifact.kind(),
            file_name: file_name.clone(),
            size,
            checksum,
            key: None,
        };

        if let Some(uploader) = &self.uploader {
            let uploader = Arc::clone(uploader);
            match tokio::task::spawn_blocking(move || uploader.upload(artifact)).await {
                Ok(Ok(Some(key))) => staged.key = Some(key.to_string()),
                Ok(Ok(None)) => log::warn!("{} vanished before upload", file_name),
                Ok(Err(e)) => report.failures.push(failure(&unit, &file_name, e)),
                Err(e) => report.failures.push(failure(&unit, &file_name, e)),
            }
        } else {
            log::info!("Dry run, leaving {} staged", file_name);
        }

        report.artifacts.push(staged);
    }
}

fn failure(unit: &str, file_name: &str, error: impl std::fmt::Display) -> super::StageFailure {
    let failure = super::StageFailure::new(unit, Stage::Upload, format!("{file_name}: {error}"));
    log::error!("{}", failure);
    failure
}
