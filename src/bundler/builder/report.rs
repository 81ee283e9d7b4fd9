//! Run outcome: per-stage failures and published artifacts.

use crate::bundler::{BuildArtifact, StagedArtifact};
use std::fmt;

/// Step of the pipeline a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Resolving the unit and classifying its runtime
    Detect,
    /// Building the code archive
    Build,
    /// Resolving dependencies into the layer archive
    Layer,
    /// Publishing an archive
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Detect => "detect",
            Stage::Build => "build",
            Stage::Layer => "layer",
            Stage::Upload => "upload",
        })
    }
}

/// One failed step of one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    /// Unit path as given by the caller
    pub unit: String,
    /// Failing stage
    pub stage: Stage,
    /// Human-readable reason
    pub message: String,
}

impl StageFailure {
    pub fn new(unit: impl Into<String>, stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            unit: unit.into(),
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} failed: {}", self.unit, self.stage, self.message)
    }
}

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Building,
    Uploading,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of packaging one unit.
#[derive(Debug)]
pub struct UnitOutcome {
    /// Unit path as given by the caller
    pub unit: String,
    /// Staged archives, ready for upload
    pub artifacts: Vec<BuildArtifact>,
    /// Failed stages
    pub failures: Vec<StageFailure>,
}

impl UnitOutcome {
    pub(crate) fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            artifacts: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, stage: Stage, message: impl fmt::Display) {
        let failure = StageFailure::new(self.unit.clone(), stage, message);
        log::error!("{}", failure);
        self.failures.push(failure);
    }

    /// Whether every attempted stage succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    state: PipelineState,
    /// Staged archives, with storage keys once uploaded
    pub artifacts: Vec<StagedArtifact>,
    /// Every failure, in unit order
    pub failures: Vec<StageFailure>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
            artifacts: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl RunReport {
    /// Current state; `Done` or `Failed` once the run has finished.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub(crate) fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
    }

    /// Moves to `Done`, or `Failed` when any stage failed.
    pub(crate) fn finish(&mut self) {
        let next = if self.failures.is_empty() {
            PipelineState::Done
        } else {
            PipelineState::Failed
        };
        self.transition(next);
    }

    /// Whether the run finished without any failure.
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// Units with at least one failure, in first-failure order.
    pub fn failed_units(&self) -> Vec<&str> {
        let mut units: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !units.contains(&failure.unit.as_str()) {
                units.push(&failure.unit);
            }
        }
        units
    }

    /// Published storage keys.
    pub fn uploaded_keys(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter_map(|a| a.key.as_deref())
            .collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(
                f,
                "{} artifact(s) staged, {} uploaded",
                self.artifacts.len(),
                self.uploaded_keys().len()
            );
        }

        write!(
            f,
            "{} failure(s) in {} unit(s):",
            self.failures.len(),
            self.failed_units().len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}
