//! Run orchestration and per-unit packaging.
//!
//! This module provides the [`Orchestrator`] that drives a whole run and the
//! [`Packager`] that turns one unit into staged archives.
//!
//! # Overview
//!
//! The orchestrator:
//! 1. Resolves every unit path from [`Settings`](crate::bundler::Settings)
//! 2. Packages units concurrently through the runtime's build strategy
//! 3. Calculates checksums of the staged archives
//! 4. Uploads them and records storage keys
//! 5. Returns a [`RunReport`] with every failure
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Orchestrator`] and the run state machine
//! - [`packager`] - Staging paths and strategy dispatch for one unit
//! - [`report`] - Stage failures and the run report
//! - [`tool_detection`] - External tool availability checking

mod checksum;
mod orchestrator;
mod packager;
mod report;
pub(crate) mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::Orchestrator;
pub use packager::{Packager, WORK_DIR};
pub use report::{PipelineState, RunReport, Stage, StageFailure, UnitOutcome};
