//! Deployment target for compiled units.

use std::{fmt, str::FromStr};

/// CPU architecture of the serverless platform.
///
/// Compiled units are cross-compiled for this architecture regardless of the
/// host running the pipeline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Arch {
    /// x86_64 / AMD64
    #[default]
    X86_64,
    /// AArch64 / ARM64 (Graviton)
    AArch64,
}

impl Arch {
    /// Architecture name as understood by `GOARCH`.
    pub fn go_arch(&self) -> &'static str {
        match self {
            Arch::X86_64 => "amd64",
            Arch::AArch64 => "arm64",
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "x86-64" => Ok(Arch::X86_64),
            "arm64" | "aarch64" => Ok(Arch::AArch64),
            other => Err(format!(
                "unsupported architecture '{other}' (expected amd64 or arm64)"
            )),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.go_arch())
    }
}

/// Operating system and architecture compiled units are built for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    /// `GOOS` value
    pub os: String,
    /// Target architecture
    pub arch: Arch,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            os: "linux".to_string(),
            arch: Arch::default(),
        }
    }
}
