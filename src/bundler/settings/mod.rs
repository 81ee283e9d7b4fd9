//! Configuration structures for packaging runs.
//!
//! Settings are assembled from command line input through
//! [`SettingsBuilder`], which rejects incomplete configuration before any
//! unit is processed.

mod arch;
mod builder;
mod core;
mod publish;

pub use arch::{Arch, Target};
pub use builder::{DEFAULT_GO_BINARY_NAME, SettingsBuilder};
pub use self::core::{Settings, Toolchain};
pub use publish::{AssumeRole, CommitHashFormat, Destination};
