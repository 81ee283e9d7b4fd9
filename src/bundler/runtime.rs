//! Runtime detection from marker files.
//!
//! Classification is a pure filesystem predicate: the first rule whose marker
//! files exist wins. The order matters for directories carrying markers of
//! more than one ecosystem (a Go module with a `package.json` for tooling is
//! still a Go unit).

use std::{fmt, path::Path};

/// Execution ecosystem a source unit targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Runtime {
    /// Compiled to a single static executable (Go)
    Compiled,
    /// Interpreted sources plus a dependency manifest (Python)
    InterpretedWithManifest,
    /// Scripts with a bundler/type-checker configuration (TypeScript)
    BundledScript,
    /// Plain dynamic scripts, never compiled (Node.js)
    Script,
    /// No marker matched; terminal, nothing is built
    Unknown,
}

/// Detection rules in priority order.
const RULES: &[(Runtime, &[&str])] = &[
    (Runtime::Compiled, &["go.mod", "go.sum"]),
    (
        Runtime::InterpretedWithManifest,
        &["requirements.txt", "Pipfile", "Pipfile.lock"],
    ),
    (Runtime::BundledScript, &["tsconfig.json"]),
    (
        Runtime::Script,
        &["package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml"],
    ),
];

impl Runtime {
    /// Short ecosystem name used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Runtime::Compiled => "go",
            Runtime::InterpretedWithManifest => "python",
            Runtime::BundledScript => "typescript",
            Runtime::Script => "nodejs",
            Runtime::Unknown => "unknown",
        }
    }

    /// Whether a build strategy exists for this runtime.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Runtime::Unknown)
    }

    /// Marker files that select this runtime.
    pub fn markers(&self) -> &'static [&'static str] {
        RULES
            .iter()
            .find(|(runtime, _)| runtime == self)
            .map(|(_, markers)| *markers)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies the directory at `path`.
///
/// Only regular files count as markers. A missing directory is `Unknown`.
pub fn detect(path: &Path) -> Runtime {
    for (runtime, markers) in RULES {
        if let Some(marker) = markers.iter().find(|m| path.join(m).is_file()) {
            log::debug!(
                "{} classified as {} (found {})",
                path.display(),
                runtime,
                marker
            );
            return *runtime;
        }
    }

    log::debug!("{} matched no runtime marker", path.display());
    Runtime::Unknown
}
