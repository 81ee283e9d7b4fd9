//! Build strategies, one per runtime.
//!
//! A strategy turns a source unit into a code archive and, when the unit
//! declares external dependencies, a layer archive. The code archive is
//! always staged first; a layer is only attempted once code succeeded and
//! never touches the code archive.

mod go;
mod node;
mod python;

pub use go::GoStrategy;
pub use node::NodeStrategy;
pub use python::PythonStrategy;

use crate::{
    bundler::{
        ArtifactKind, BuildArtifact, Error, Result, Runtime, Settings,
        utils::process::ToolRunner,
    },
    source::SourceUnit,
};
use std::{path::Path, sync::Arc};
use thiserror::Error;

/// Everything a strategy needs to build one unit.
pub struct BuildContext<'a> {
    /// Unit being built
    pub unit: &'a Arc<SourceUnit>,
    /// Run settings
    pub settings: &'a Settings,
    /// External tool capability
    pub tools: &'a dyn ToolRunner,
    /// Per-unit intermediate directory (`<staging>/<baseName>/`), already created
    pub work_dir: &'a Path,
    /// Destination of the code archive
    pub code_archive: &'a Path,
    /// Destination of the layer archive
    pub layer_archive: &'a Path,
}

impl BuildContext<'_> {
    /// Source directory of the unit.
    pub fn unit_dir(&self) -> &Path {
        self.unit.absolute_path()
    }

    fn artifact(&self, kind: ArtifactKind) -> BuildArtifact {
        let path = match kind {
            ArtifactKind::Code => self.code_archive,
            ArtifactKind::Layer => self.layer_archive,
        };
        BuildArtifact::new(kind, path, Arc::clone(self.unit))
    }
}

/// A failed code or layer build.
#[derive(Debug, Error)]
#[error("{runtime} {kind} build failed: {source}")]
pub struct BuildError {
    /// Runtime of the unit
    pub runtime: Runtime,
    /// Which archive failed
    pub kind: ArtifactKind,
    /// Underlying failure, including tool diagnostics
    pub source: Error,
}

impl BuildError {
    /// Dependency resolution failures are scoped to the layer archive.
    pub fn is_dependency_resolution(&self) -> bool {
        self.kind == ArtifactKind::Layer
    }
}

/// Per-archive outcome of one build.
#[derive(Debug)]
pub struct BuildOutput {
    /// Code archive, or why it could not be built
    pub code: std::result::Result<BuildArtifact, BuildError>,
    /// `None` when no layer applies (no dependencies, or code failed)
    pub layer: Option<std::result::Result<BuildArtifact, BuildError>>,
}

/// Builds the archives of one runtime.
pub trait BuildStrategy: Send + Sync {
    /// Runtime this strategy handles.
    fn runtime(&self) -> Runtime;

    /// Writes the code archive to [`BuildContext::code_archive`].
    fn build_code(&self, ctx: &BuildContext<'_>) -> Result<()>;

    /// Writes the layer archive to [`BuildContext::layer_archive`].
    ///
    /// Returns `false` when the unit declares no external dependencies.
    fn build_layer(&self, _ctx: &BuildContext<'_>) -> Result<bool> {
        Ok(false)
    }

    /// Builds code, then the layer.
    fn build(&self, ctx: &BuildContext<'_>) -> BuildOutput {
        let runtime = self.runtime();

        if let Err(source) = self.build_code(ctx) {
            return BuildOutput {
                code: Err(BuildError {
                    runtime,
                    kind: ArtifactKind::Code,
                    source,
                }),
                layer: None,
            };
        }
        let code = ctx.artifact(ArtifactKind::Code);
        log::info!("Staged {}", code);

        let layer = match self.build_layer(ctx) {
            Ok(true) => {
                let layer = ctx.artifact(ArtifactKind::Layer);
                log::info!("Staged {}", layer);
                Some(Ok(layer))
            }
            Ok(false) => {
                log::debug!("{} declares no dependencies, no layer", ctx.unit);
                None
            }
            Err(source) => Some(Err(BuildError {
                runtime,
                kind: ArtifactKind::Layer,
                source,
            })),
        };

        BuildOutput {
            code: Ok(code),
            layer,
        }
    }
}

/// Selects the strategy for `runtime`; `None` for [`Runtime::Unknown`].
pub fn strategy_for(runtime: Runtime) -> Option<Box<dyn BuildStrategy>> {
    match runtime {
        Runtime::Compiled => Some(Box::new(GoStrategy)),
        Runtime::InterpretedWithManifest => Some(Box::new(PythonStrategy)),
        Runtime::BundledScript => Some(Box::new(NodeStrategy::typescript())),
        Runtime::Script => Some(Box::new(NodeStrategy::javascript())),
        Runtime::Unknown => None,
    }
}
