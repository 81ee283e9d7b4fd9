//! Serverless function packager for CI pipelines
//!
//! This library builds function source directories into deployable archives:
//! - Go modules cross-compiled into a single executable
//! - Python sources with a `python/` dependency layer
//! - Node.js and TypeScript sources with a `nodejs/node_modules` layer
//!
//! Archives are published to `{repository}/{commit}/{file}` in object storage.
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod source;
pub mod upload;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
