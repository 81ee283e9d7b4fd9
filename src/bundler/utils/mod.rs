//! Shared utilities: filesystem helpers, archiving and tool execution.

pub mod archive;
pub mod fs;
pub mod process;

#[cfg(test)]
pub(crate) mod testutil;
