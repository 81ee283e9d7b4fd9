//! Command line argument parsing and validation.
//!
//! Every pipeline input can also be given through the environment variables
//! GitHub Actions sets for action inputs (`INPUT_<NAME>`), so the binary runs
//! unchanged as an action step.

use crate::{
    bundler::{Arch, CommitHashFormat, Destination, Settings, SettingsBuilder, Target},
    error::{CliError, Result},
    source::parse_unit_paths,
};
use clap::{ArgAction, Parser, builder::FalseyValueParser};
use std::{path::PathBuf, time::Duration};

/// Serverless function packager
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_lambda",
    version,
    about = "Builds serverless function sources into code and layer archives and publishes them",
    long_about = "Builds every listed function directory with the toolchain of its runtime (Go, Python, Node.js, TypeScript), packages it as {name}.zip plus an optional {name}_layer.zip dependency layer, and uploads both to {repository}/{commit}/ in the destination bucket.

Usage:
  kodegen_bundler_lambda --lambda-paths $'functions/orders\\nfunctions/billing' --s3-bucket my-artifacts
  kodegen_bundler_lambda --lambda-paths fn-a --s3-bucket file:///tmp/bucket --dry-run

Exit code 0 = every unit built and uploaded, 1 = at least one stage failed, 2 = invalid configuration."
)]
pub struct Args {
    /// Function directories relative to the repository root, one per line
    #[arg(long, env = "INPUT_LAMBDA-PATHS", value_name = "PATHS")]
    pub lambda_paths: Option<String>,

    /// Destination bucket name, s3://bucket, or file:///dir for a local directory
    #[arg(long, env = "INPUT_S3-BUCKET", value_name = "BUCKET")]
    pub s3_bucket: Option<String>,

    /// Use the abbreviated commit hash in storage keys
    #[arg(
        long,
        env = "INPUT_SHORT-COMMIT-HASH",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub short_commit_hash: bool,

    /// Role to assume before uploading (requires --aws-region)
    #[arg(long, env = "INPUT_AWS-ROLE", value_name = "ARN")]
    pub aws_role: Option<String>,

    /// Region of the assumed role session (requires --aws-role)
    #[arg(long, env = "INPUT_AWS-REGION", value_name = "REGION")]
    pub aws_region: Option<String>,

    /// Directory for staged archives and per-unit work directories
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Operating system compiled units are built for
    #[arg(long, default_value = "linux", value_name = "OS")]
    pub target_os: String,

    /// Architecture compiled units are built for: amd64 or arm64
    #[arg(long, default_value = "amd64", value_name = "ARCH")]
    pub target_arch: Arch,

    /// Executable name inside compiled code archives
    #[arg(long, value_name = "NAME")]
    pub go_binary_name: Option<String>,

    /// Timeout for each external tool invocation, in seconds
    #[arg(long, default_value_t = 900, value_name = "SECS")]
    pub tool_timeout_secs: u64,

    /// Units built concurrently (default: number of CPUs)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Repository root; discovered with git when omitted
    #[arg(long, value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Build and stage archives without uploading them
    #[arg(long)]
    pub dry_run: bool,

    /// Print detailed progress
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validates the arguments into run settings.
    ///
    /// Action inputs that are not set arrive as empty variables; they are
    /// treated as absent.
    pub fn to_settings(&self) -> Result<Settings> {
        let paths = non_empty(&self.lambda_paths).ok_or_else(|| CliError::MissingArgument {
            argument: "lambda-paths".to_string(),
        })?;
        let bucket = non_empty(&self.s3_bucket).ok_or_else(|| CliError::MissingArgument {
            argument: "s3-bucket".to_string(),
        })?;

        let format = if self.short_commit_hash {
            CommitHashFormat::Short
        } else {
            CommitHashFormat::Full
        };

        let mut builder = SettingsBuilder::new()
            .unit_paths(parse_unit_paths(paths))
            .destination(Destination::parse(bucket)?)
            .commit_hash_format(format)
            .target(Target {
                os: self.target_os.clone(),
                arch: self.target_arch,
            })
            .tool_timeout(Duration::from_secs(self.tool_timeout_secs))
            .dry_run(self.dry_run);

        match (non_empty(&self.aws_role), non_empty(&self.aws_region)) {
            (Some(role), Some(region)) => {
                builder = builder.assume_role(role.to_string(), region.to_string());
            }
            (None, None) => {}
            _ => {
                return Err(CliError::InvalidArguments {
                    reason: "--aws-role and --aws-region must be given together".to_string(),
                }
                .into());
            }
        }

        if let Some(dir) = &self.staging_dir {
            builder = builder.staging_dir(dir);
        }
        if let Some(root) = &self.repo_root {
            builder = builder.repo_root(root);
        }
        if let Some(name) = &self.go_binary_name {
            builder = builder.go_binary_name(name.clone());
        }
        if let Some(jobs) = self.jobs {
            builder = builder.jobs(jobs);
        }

        Ok(builder.build()?)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print error message
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
