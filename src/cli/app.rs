//! Main CLI application structure

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{batch_cmd, item_cmd};
use crate::domain::{IdentifierQuery, ItemType};
use crate::storage::{Config, Workspace};

/// Environment variable holding a tracing filter (e.g. `taskbridge=debug`)
pub const LOG_ENV: &str = "TASKBRIDGE_LOG";

#[derive(Parser)]
#[command(name = "taskbridge")]
#[command(author, version, about = "Batch hierarchical item creation for task-management applications")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Item type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ItemKind {
    Task,
    Project,
}

impl From<ItemKind> for ItemType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Task => ItemType::Task,
            ItemKind::Project => ItemType::Project,
        }
    }
}

/// Identifies one existing item; `--id` wins when both are given
#[derive(Debug, Clone, Args)]
pub struct IdentArgs {
    /// Item ID
    #[arg(long)]
    pub id: Option<String>,

    /// Exact item name (case-sensitive)
    #[arg(long)]
    pub name: Option<String>,
}

impl From<IdentArgs> for IdentifierQuery {
    fn from(args: IdentArgs) -> Self {
        IdentifierQuery {
            id: args.id,
            name: args.name,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskbridge workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Use a bridge executable instead of the local item store
        #[arg(long, value_name = "COMMAND")]
        bridge: Option<String>,

        /// Extra argument for the bridge command (repeatable)
        #[arg(long = "bridge-arg", requires = "bridge", allow_hyphen_values = true)]
        bridge_args: Vec<String>,
    },

    /// Create a batch of items from a JSON or YAML array
    ///
    /// Items may reference each other through `tempId` / `parentTempId`:
    ///   [{"type":"project","name":"Launch","tempId":"p"},
    ///    {"type":"task","name":"Plan","parentTempId":"p"}]
    Batch {
        /// Input file (`.json`, `.yaml`, `.yml`) or `-` for stdin
        input: String,

        /// Run against an in-memory copy of the workspace items
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a single task or project
    Add(item_cmd::AddArgs),

    /// Edit a task or project
    Edit(item_cmd::EditArgs),

    /// Remove a task or project and everything it contains
    Remove {
        #[arg(value_enum)]
        item_type: ItemKind,

        #[command(flatten)]
        ident: IdentArgs,
    },

    /// Show a task or project
    Show {
        #[arg(value_enum)]
        item_type: ItemKind,

        #[command(flatten)]
        ident: IdentArgs,
    },

    /// Move a task into a project, under another task, or to the inbox
    Move(item_cmd::MoveArgs),

    /// List tasks or projects
    List {
        #[arg(value_enum)]
        item_type: ItemKind,
    },

    /// Show the configured bridge's manifest
    BridgeInfo,
}

/// Installs the stderr tracing subscriber
///
/// `TASKBRIDGE_LOG` takes precedence; otherwise `warn`, or `debug` with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()
            .map(|config| config.global.default_format.into())
            .unwrap_or_default(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose_ctx("main", "taskbridge starting");

    let code = match cli.command {
        Commands::Init {
            path,
            bridge,
            bridge_args,
        } => {
            output.verbose_ctx("init", &format!("Initializing workspace at: {}", path));
            let mut workspace = Workspace::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .taskbridge directory at: {}", workspace.dir().display()),
            );
            if let Some(command) = bridge {
                output.verbose_ctx("init", &format!("Using bridge: {}", command));
                workspace.use_bridge(command, bridge_args)?;
            }
            output.message(&format!(
                "Initialized taskbridge workspace at {}",
                workspace.root().display()
            ));
            ExitCode::SUCCESS
        }

        Commands::Batch { input, dry_run } => batch_cmd::run(&output, &input, dry_run)?,

        Commands::Add(args) => item_cmd::add(&output, args)?,
        Commands::Edit(args) => item_cmd::edit(&output, args)?,
        Commands::Remove { item_type, ident } => {
            item_cmd::remove(&output, item_type.into(), ident.into())?
        }
        Commands::Show { item_type, ident } => {
            item_cmd::show(&output, item_type.into(), ident.into())?
        }
        Commands::Move(args) => item_cmd::move_item(&output, args)?,
        Commands::List { item_type } => item_cmd::list(&output, item_type.into())?,
        Commands::BridgeInfo => item_cmd::bridge_info(&output)?,
    };

    output.verbose_ctx("main", "command completed");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_move_flags() {
        let cli = Cli::try_parse_from([
            "taskbridge",
            "move",
            "--name",
            "Paint",
            "--to-project",
            "Home",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Move(_)));
    }

    #[test]
    fn move_requires_destination() {
        assert!(Cli::try_parse_from(["taskbridge", "move", "--id", "t-1"]).is_err());
    }

    #[test]
    fn bridge_arg_requires_bridge() {
        assert!(Cli::try_parse_from(["taskbridge", "init", "--bridge-arg", "-q"]).is_err());
        assert!(Cli::try_parse_from([
            "taskbridge",
            "init",
            "--bridge",
            "omnifocus-bridge",
            "--bridge-arg",
            "-q"
        ])
        .is_ok());
    }

    #[test]
    fn format_is_global() {
        let cli = Cli::try_parse_from(["taskbridge", "list", "task", "--format", "json"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }
}
