//! Command line interface for the serverless packager.
//!
//! Parses arguments, wires the concrete collaborators (system tools, git,
//! object store, credentials) into an [`Orchestrator`] and reports the run.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::{OutputManager, format_bytes};

use crate::{
    bundler::{
        Destination, Orchestrator, RunReport, Settings,
        builder::tool_detection,
        utils::process::{SystemToolRunner, ToolRunner},
    },
    error::{BundlerError, CliError, EXIT_FAILURE, EXIT_SUCCESS, Result},
    upload::{
        AmbientCredentials, AssumeRoleCredentials, AwsCliStore, CredentialProvider,
        FsObjectStore, GitCli, ObjectStore, Uploader, VersionControl,
    },
};
use path_absolutize::Absolutize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = RuntimeConfig::from(&args);

    match execute(&args, &config).await {
        Ok(report) => {
            print_report(&report, &config)?;
            Ok(if report.is_success() {
                EXIT_SUCCESS
            } else {
                EXIT_FAILURE
            })
        }
        Err(e) => {
            config.error(&e.to_string())?;
            for suggestion in e.recovery_suggestions() {
                config.indent(&suggestion)?;
            }
            Ok(e.exit_code())
        }
    }
}

/// Runs the pipeline described by `args`.
///
/// Configuration problems are returned as errors before any unit is
/// touched; unit failures are part of the returned report.
pub async fn execute(args: &Args, config: &RuntimeConfig) -> Result<RunReport> {
    let settings = Arc::new(args.to_settings()?);
    let tools: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner::new(settings.tool_timeout()));

    let repo_root = repository_root(&settings, &tools)?;
    config.verbose_println(&format!("Repository root: {}", repo_root.display()))?;

    let uploader = if settings.dry_run() {
        config.warn("Dry run: archives are staged but not uploaded")?;
        None
    } else {
        Some(Arc::new(uploader(&settings, &tools, &repo_root)))
    };

    tool_detection::warn_missing(required_programs(&settings, uploader.is_some()));

    config.section(&format!(
        "Packaging {} unit(s) into {}",
        settings.unit_paths().len(),
        settings.staging_dir().display()
    ))?;
    for path in settings.unit_paths() {
        config.progress(path)?;
    }

    let orchestrator = Orchestrator::new(Arc::clone(&settings), tools, uploader);
    Ok(orchestrator.run(&repo_root).await?)
}

/// Configured root, or the top level of the git checkout around the
/// current directory.
fn repository_root(settings: &Settings, tools: &Arc<dyn ToolRunner>) -> Result<PathBuf> {
    if let Some(root) = settings.repo_root() {
        let root = root.absolutize()?.into_owned();
        if !root.is_dir() {
            return Err(CliError::RepositoryRoot {
                reason: format!("{} is not a directory", root.display()),
            }
            .into());
        }
        return Ok(root);
    }

    let cwd = std::env::current_dir()?;
    GitCli::new(Arc::clone(tools), &settings.toolchain().git, cwd)
        .repository_root()
        .map_err(|e| {
            BundlerError::from(CliError::RepositoryRoot {
                reason: e.to_string(),
            })
        })
}

fn uploader(settings: &Settings, tools: &Arc<dyn ToolRunner>, repo_root: &Path) -> Uploader {
    let toolchain = settings.toolchain();

    let store: Arc<dyn ObjectStore> = match settings.destination() {
        Destination::S3 { bucket } => Arc::new(AwsCliStore::new(
            bucket.as_str(),
            toolchain.aws.as_str(),
            Arc::clone(tools),
        )),
        Destination::Directory(dir) => Arc::new(FsObjectStore::new(dir)),
    };

    let credentials: Arc<dyn CredentialProvider> = match settings.assume_role() {
        Some(role) => Arc::new(AssumeRoleCredentials::new(
            role.clone(),
            toolchain.aws.as_str(),
            Arc::clone(tools),
        )),
        None => Arc::new(AmbientCredentials),
    };

    let vcs: Arc<dyn VersionControl> =
        Arc::new(GitCli::new(Arc::clone(tools), &toolchain.git, repo_root));

    Uploader::new(store, vcs, credentials, settings.commit_hash_format())
}

fn required_programs(settings: &Settings, uploading: bool) -> Vec<&str> {
    let toolchain = settings.toolchain();
    let mut programs = vec![toolchain.go.as_str(), toolchain.pip.as_str(), toolchain.npm.as_str()];
    if uploading {
        programs.push(toolchain.git.as_str());
        let uses_aws = matches!(settings.destination(), Destination::S3 { .. })
            || settings.assume_role().is_some();
        if uses_aws {
            programs.push(toolchain.aws.as_str());
        }
    }
    programs
}

fn print_report(report: &RunReport, config: &RuntimeConfig) -> std::io::Result<()> {
    if !report.artifacts.is_empty() {
        config.section("Artifacts")?;
    }
    for artifact in &report.artifacts {
        let line = format!(
            "{} ({}, {})",
            artifact.file_name,
            artifact.kind,
            format_bytes(artifact.size)
        );
        match &artifact.key {
            Some(key) => config.success(&format!("{line} -> {key}"))?,
            None => config.progress(&line)?,
        }
        config.verbose_println(&format!("    sha256 {}", artifact.checksum))?;
    }

    if report.is_success() {
        config.success(&report.to_string())
    } else {
        config.section(&format!(
            "{} failure(s) in {} unit(s)",
            report.failures.len(),
            report.failed_units().len()
        ))?;
        for failure in &report.failures {
            config.error(&failure.to_string())?;
        }
        Ok(())
    }
}
