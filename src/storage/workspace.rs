//! Workspace management
//!
//! Handles workspace initialization and builds the configured backend.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::backend::{Backend, BridgeBackend, MemoryBackend, StoreBackend};

use super::config::{BackendKind, BridgeConfig, Config};
use super::ItemStore;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in a taskbridge workspace. Run 'taskbridge init' first.")]
    NotInWorkspace,
}

const DEFAULT_CONFIG: &str = r#"# taskbridge configuration

# Application backend: "store" (local items.jsonl) or "bridge" (external executable)
backend = "store"

# [bridge]
# command = "taskbridge-omnifocus"
# args = []
"#;

const GITIGNORE: &str = r#"# Temp files from atomic rewrites
*.tmp

# Store lock
items.lock
"#;

/// A taskbridge workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(".taskbridge").is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = Config::find_workspace_root(&cwd).ok_or(WorkspaceError::NotInWorkspace)?;

        Self::open(root)
    }

    /// Initializes a new workspace at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = root.join(".taskbridge");

        fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create .taskbridge directory: {}", dir.display())
        })?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let items_path = dir.join("items.jsonl");
        if !items_path.exists() {
            fs::write(&items_path, "")
                .with_context(|| format!("Failed to create item store: {}", items_path.display()))?;
        }

        let gitignore_path = dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskbridge directory path
    pub fn dir(&self) -> PathBuf {
        self.root.join(".taskbridge")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Switches the workspace to a bridge backend and saves the config
    pub fn use_bridge(&mut self, command: impl Into<String>, args: Vec<String>) -> Result<()> {
        self.config.project.backend = BackendKind::Bridge;
        self.config.project.bridge = BridgeConfig {
            command: Some(command.into()),
            args,
        };
        self.config.save_project()
    }

    /// Returns the local item store
    pub fn item_store(&self) -> ItemStore {
        ItemStore::for_workspace(&self.root)
    }

    /// Builds the backend selected by the workspace config
    pub fn backend(&self) -> Result<Box<dyn Backend>> {
        match self.config.project.backend {
            BackendKind::Store => Ok(Box::new(StoreBackend::new(self.item_store()))),
            BackendKind::Bridge => {
                let (command, args) = self.config.bridge_command()?;
                Ok(Box::new(BridgeBackend::new(command, args)))
            }
        }
    }

    /// In-memory copy of the local items, for dry runs
    pub fn dry_run_backend(&self) -> Result<MemoryBackend> {
        let items = self
            .item_store()
            .read_all()
            .context("Failed to load items for dry run")?;
        Ok(MemoryBackend::with_items(items))
    }
}
