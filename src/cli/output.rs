//! Terminal output for run progress.
//!
//! Colors are applied only when the stream supports them. Under GitHub
//! Actions, errors are also emitted as `::error::` workflow commands so they
//! show up as annotations on the run.

use owo_colors::{OwoColorize, Stream};
use std::io::{self, Write};

const SUCCESS: &str = "✓";
const ERROR: &str = "✗";
const WARNING: &str = "⚠";
const ARROW: &str = "→";

/// Writes user-facing progress to stdout and problems to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    annotate: bool,
}

impl OutputManager {
    /// Creates an output manager; workflow annotations follow `GITHUB_ACTIONS`.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let annotate = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
        Self {
            verbose,
            quiet,
            annotate,
        }
    }

    /// Prints a message only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout(),
            "{}",
            message.if_supports_color(Stream::Stdout, |s| s.dimmed())
        )
    }

    /// Prints a section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout(),
            "\n{}",
            title.if_supports_color(Stream::Stdout, |s| s.bold())
        )
    }

    /// Prints a progress step.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout(),
            "{} {}",
            ARROW.if_supports_color(Stream::Stdout, |s| s.blue()),
            message
        )
    }

    /// Prints a success message.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout(),
            "{} {}",
            SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
            message
        )
    }

    /// Prints an indented detail line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stdout(), "    {message}")
    }

    /// Prints a warning.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stderr(),
            "{} {}",
            WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
            message.if_supports_color(Stream::Stderr, |s| s.yellow())
        )
    }

    /// Prints an error, even in quiet mode.
    pub fn error(&self, message: &str) -> io::Result<()> {
        let mut stderr = io::stderr();
        writeln!(
            stderr,
            "{} {}",
            ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
            message.if_supports_color(Stream::Stderr, |s| s.red())
        )?;
        if self.annotate {
            writeln!(io::stdout(), "::error::{}", escape_workflow_data(message))?;
        }
        Ok(())
    }
}

/// Escapes a workflow command payload.
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Human readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_data_is_escaped() {
        assert_eq!(
            escape_workflow_data("fn-a: build failed: 100%\nexit 1\r"),
            "fn-a: build failed: 100%25%0Aexit 1%0D"
        );
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
