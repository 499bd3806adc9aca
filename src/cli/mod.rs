//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Workspace management | `init`, `bridge-info` |
//! | Batch | Hierarchical creation | `batch items.json`, `batch - --dry-run` |
//! | Items | Single-item operations | `add`, `edit`, `remove`, `show`, `move`, `list` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! taskbridge --verbose batch items.json
//! ```
//!
//! `TASKBRIDGE_LOG` accepts a tracing filter for finer control.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod batch_cmd;
mod item_cmd;
mod output;

pub use app::{run, Cli, Commands, IdentArgs, ItemKind, LOG_ENV};
pub use output::{Output, OutputFormat};
