//! Build-and-package core.
//!
//! Turns source units into deployable archives:
//!
//! - [`runtime`] classifies a unit from its marker files
//! - [`strategy`] holds one build strategy per runtime
//! - [`builder`] stages archives per unit and drives whole runs
//! - [`settings`] carries validated run configuration
//!
//! Failures of one unit never stop the others; they are collected into a
//! [`RunReport`].

mod artifact;
pub mod builder;
pub mod error;
pub mod runtime;
pub mod settings;
pub mod strategy;
pub mod utils;

pub use artifact::{ArtifactKind, BuildArtifact, StagedArtifact};
pub use builder::{
    Orchestrator, Packager, PipelineState, RunReport, Stage, StageFailure, UnitOutcome,
};
pub use error::{Error, Result};
pub use runtime::Runtime;
pub use settings::{
    Arch, AssumeRole, CommitHashFormat, DEFAULT_GO_BINARY_NAME, Destination, Settings,
    SettingsBuilder, Target, Toolchain,
};
