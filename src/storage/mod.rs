//! # Storage Layer
//!
//! Persistence layer for taskbridge with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSONL (one JSON per line) | `.taskbridge/items.jsonl` |
//! | Config | TOML | `.taskbridge/config.toml` |
//! | Global config | TOML | `~/.config/taskbridge/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`ItemStore`] locks `items.lock` (`fs2`): shared for reads, exclusive
//!   for the whole read-modify-write of [`ItemStore::update`]
//! - Rewrites are atomic (temp file + rename)
//!
//! ## Workspace Structure
//!
//! ```text
//! .taskbridge/
//! ├── items.jsonl           # Items owned by the local store backend
//! ├── items.lock            # Lock file guarding items.jsonl
//! ├── config.toml           # Workspace configuration
//! └── .gitignore            # Ignores temp files
//! ```

mod config;
mod jsonl;
mod workspace;

pub use config::{
    BackendKind, BridgeConfig, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig,
    BRIDGE_COMMAND_ENV, CONFIG_DIR_ENV,
};
pub use jsonl::ItemStore;
pub use workspace::{Workspace, WorkspaceError};
