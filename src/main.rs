//! Kodegen Bundler Lambda - serverless function packager for CI pipelines.
//!
//! This binary builds every listed function directory, packages code and
//! dependency layer archives, and uploads them keyed by repository and commit.

use anyhow::Context;
use kodegen_bundler_lambda::cli;
use std::process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Unit failures are part of the exit code; only unwritable output lands here
    let exit_code = cli::run().await.context("failed to report the run")?;

    process::exit(exit_code);
}
