//! Output formatting for CLI commands
//!
//! Results go to stdout, diagnostics and `--verbose` context go to stderr,
//! so JSON output can always be piped into another program.

use std::process::ExitCode;

use serde::Serialize;

use crate::storage;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Maps a response's `success` flag to the process exit code
pub fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Output helper shared by every command
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a one-line confirmation
    pub fn message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => self.json(&serde_json::json!({
                "success": true,
                "message": message
            })),
        }
    }

    /// Prints a failure for humans: the message, then one indented detail per line
    ///
    /// Text mode only; JSON callers print the full response instead.
    pub fn failure(&self, message: &str, details: &[String]) {
        if self.format == OutputFormat::Text {
            eprintln!("Error: {}", message);
            for detail in details {
                eprintln!("  {}", detail);
            }
        }
    }

    /// Prints a value as one compact JSON line
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(line) => println!("{}", line),
            Err(err) => tracing::error!(error = %err, "failed to serialize output"),
        }
    }

    /// Prints a value compactly in JSON mode, indented in text mode
    pub fn document<T: Serialize>(&self, value: &T) {
        if self.is_json() {
            return self.json(value);
        }
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(err) => tracing::error!(error = %err, "failed to serialize output"),
        }
    }

    /// Prints a tab-separated row (text only)
    pub fn row(&self, columns: &[&str]) {
        if self.format == OutputFormat::Text {
            println!("{}", columns.join("\t"));
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_format_converts() {
        assert_eq!(OutputFormat::from(storage::OutputFormat::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(storage::OutputFormat::default()), OutputFormat::Text);
    }
}
