//! Configuration handling for taskbridge
//!
//! Configuration is stored in `.taskbridge/config.toml` (workspace) and
//! `~/.config/taskbridge/config.toml` (global).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides the bridge command from the workspace config
pub const BRIDGE_COMMAND_ENV: &str = "TASKBRIDGE_BRIDGE_COMMAND";

/// Overrides the global config directory
pub const CONFIG_DIR_ENV: &str = "TASKBRIDGE_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which application backend commands talk to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local emulation over `.taskbridge/items.jsonl`
    #[default]
    Store,
    /// External bridge executable
    Bridge,
}

impl BackendKind {
    pub fn as_str(&self) -> &str {
        match self {
            BackendKind::Store => "store",
            BackendKind::Bridge => "bridge",
        }
    }
}

/// How to launch the bridge executable
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Program to run (looked up on PATH when not absolute)
    pub command: Option<String>,

    /// Extra arguments passed before any protocol flags
    pub args: Vec<String>,
}

/// Workspace-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    pub backend: BackendKind,

    pub bridge: BridgeConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + workspace)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub workspace_root: Option<PathBuf>,
}

/// Path of the workspace config file under `root`
fn project_config_path(root: &Path) -> PathBuf {
    root.join(".taskbridge").join("config.toml")
}

/// Reads a TOML config file; a missing file yields the defaults
fn read_toml<T: DeserializeOwned + Default>(path: &Path, scope: &str) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read {} config: {}", scope, path.display()))
        }
    };

    toml::from_str(&content)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
        .with_context(|| format!("Failed to parse {} config", scope))
}

impl Config {
    /// Loads the global config plus the config of the workspace enclosing
    /// the current directory, if any
    pub fn load() -> Result<Self> {
        let workspace_root = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::find_workspace_root(&cwd));

        Self::assemble(workspace_root)
    }

    /// Loads configuration for a specific workspace
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        Self::assemble(Some(workspace_root.to_path_buf()))
    }

    fn assemble(workspace_root: Option<PathBuf>) -> Result<Self> {
        let global = match Self::global_config_dir() {
            Some(dir) => read_toml(&dir.join("config.toml"), "global")?,
            None => GlobalConfig::default(),
        };
        let project = match &workspace_root {
            Some(root) => read_toml(&project_config_path(root), "workspace")?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            workspace_root,
        })
    }

    /// Global config directory; `TASKBRIDGE_CONFIG_DIR` wins over the
    /// platform default
    pub fn global_config_dir() -> Option<PathBuf> {
        std::env::var_os(CONFIG_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                ProjectDirs::from("dev", "taskbridge", "taskbridge")
                    .map(|dirs| dirs.config_dir().to_path_buf())
            })
    }

    /// Finds the nearest ancestor of `start` (inclusive) holding `.taskbridge/`
    pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(".taskbridge").is_dir())
            .map(Path::to_path_buf)
    }

    /// Returns the bridge command and arguments
    ///
    /// `TASKBRIDGE_BRIDGE_COMMAND` wins over `[bridge] command`.
    pub fn bridge_command(&self) -> Result<(String, Vec<String>), ConfigError> {
        let from_env = std::env::var(BRIDGE_COMMAND_ENV)
            .ok()
            .filter(|c| !c.trim().is_empty());

        from_env
            .or_else(|| self.project.bridge.command.clone())
            .map(|command| (command, self.project.bridge.args.clone()))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "backend = \"bridge\" requires [bridge] command or {}",
                    BRIDGE_COMMAND_ENV
                ))
            })
    }

    /// Writes the workspace section back to `.taskbridge/config.toml`
    pub fn save_project(&self) -> Result<()> {
        let root = self
            .workspace_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No workspace to save configuration into"))?;
        let config_path = project_config_path(root);

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize workspace config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write workspace config: {}", config_path.display()))
    }
}
