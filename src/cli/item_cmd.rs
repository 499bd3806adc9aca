//! Single-item CLI commands

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{ArgGroup, Args};

use super::app::{IdentArgs, ItemKind};
use super::output::{exit_code, Output};
use crate::backend::{operations, BridgeBackend};
use crate::batch::{BatchEngine, BatchItemRequest};
use crate::domain::{keys, ErrorKind, IdentifierQuery, ItemChanges, ItemType};
use crate::ops::{self, Destination, OperationResponse};
use crate::storage::{BackendKind, Workspace};

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(value_enum)]
    pub item_type: ItemKind,

    /// Item name
    pub name: String,

    /// ID of the project to create the task in
    #[arg(long, conflicts_with = "parent_task")]
    pub project: Option<String>,

    /// ID of the task to create this task under
    #[arg(long)]
    pub parent_task: Option<String>,

    #[arg(long)]
    pub note: Option<String>,

    #[arg(long)]
    pub flagged: bool,

    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,

    /// Defer date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub defer: Option<String>,

    /// Tag to apply (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Estimated duration in minutes
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Folder to file a project in
    #[arg(long)]
    pub folder: Option<String>,
}

impl AddArgs {
    fn into_request(self) -> BatchItemRequest {
        let mut request = BatchItemRequest::new(self.item_type.into(), self.name);
        let props = &mut request.properties;

        if let Some(project) = self.project {
            props.set(keys::PROJECT_ID, project);
        }
        if let Some(parent) = self.parent_task {
            props.set(keys::PARENT_TASK_ID, parent);
        }
        if let Some(note) = self.note {
            props.set(keys::NOTE, note);
        }
        if self.flagged {
            props.set(keys::FLAGGED, true);
        }
        if let Some(due) = self.due {
            props.set(keys::DUE_DATE, due);
        }
        if let Some(defer) = self.defer {
            props.set(keys::DEFER_DATE, defer);
        }
        if !self.tags.is_empty() {
            props.set(keys::TAGS, self.tags);
        }
        if let Some(minutes) = self.estimate {
            props.set(keys::ESTIMATED_MINUTES, minutes);
        }
        if let Some(folder) = self.folder {
            props.set(keys::FOLDER_NAME, folder);
        }

        request
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(value_enum)]
    pub item_type: ItemKind,

    #[command(flatten)]
    pub ident: IdentArgs,

    /// New name
    #[arg(long)]
    pub rename: Option<String>,

    /// New note (empty string clears it)
    #[arg(long)]
    pub note: Option<String>,

    /// Set or clear the flag
    #[arg(long)]
    pub flagged: Option<bool>,

    /// New due date (empty string clears it)
    #[arg(long)]
    pub due: Option<String>,

    /// New defer date (empty string clears it)
    #[arg(long)]
    pub defer: Option<String>,

    #[arg(long)]
    pub estimate: Option<u32>,

    /// Tag to add (repeatable)
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,

    /// Tag to remove (repeatable)
    #[arg(long = "remove-tag")]
    pub remove_tags: Vec<String>,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("destination")
        .required(true)
        .args(["to_project", "to_project_id", "to_task", "to_task_id", "inbox"])
))]
pub struct MoveArgs {
    #[command(flatten)]
    pub ident: IdentArgs,

    /// Destination project name
    #[arg(long)]
    pub to_project: Option<String>,

    /// Destination project ID
    #[arg(long)]
    pub to_project_id: Option<String>,

    /// Destination parent task name
    #[arg(long)]
    pub to_task: Option<String>,

    /// Destination parent task ID
    #[arg(long)]
    pub to_task_id: Option<String>,

    /// Move back to the inbox
    #[arg(long)]
    pub inbox: bool,
}

impl MoveArgs {
    fn destination(&self) -> Destination {
        let query = |id: &Option<String>, name: &Option<String>| IdentifierQuery {
            id: id.clone(),
            name: name.clone(),
        };

        if self.to_project.is_some() || self.to_project_id.is_some() {
            Destination::Project(query(&self.to_project_id, &self.to_project))
        } else if self.to_task.is_some() || self.to_task_id.is_some() {
            Destination::Task(query(&self.to_task_id, &self.to_task))
        } else {
            Destination::Inbox
        }
    }
}

/// Prints an operation response and maps it to an exit code
fn report(output: &Output, response: &OperationResponse, verb: &str, item_type: ItemType) -> ExitCode {
    if output.is_json() {
        output.json(response);
    } else if response.success {
        let id = response.id.as_ref().map(|id| id.as_str()).unwrap_or_default();
        output.message(&format!("{} {} {}", verb, item_type, id));
    } else {
        let ids: Vec<String> = response.matching_ids.iter().map(|id| id.to_string()).collect();
        output.failure(response.error.as_deref().unwrap_or("operation failed"), &ids);
    }

    exit_code(response.success)
}

pub fn add(output: &Output, args: AddArgs) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    let item_type: ItemType = args.item_type.into();
    let request = args.into_request();
    output.verbose_ctx("add", &format!("Creating {} '{}'", item_type, request.name));

    let batch = BatchEngine::new(backend.as_mut()).run(std::slice::from_ref(&request));

    let response = match (batch.error, batch.results.into_iter().next()) {
        (Some(error), _) => OperationResponse::failure(ErrorKind::Validation, error),
        (None, Some(result)) => match (result.id, result.error) {
            (Some(id), _) => OperationResponse::ok(id),
            (None, error) => OperationResponse::failure(
                result.error_kind.unwrap_or(ErrorKind::Creation),
                error.unwrap_or_default(),
            ),
        },
        (None, None) => bail!("batch returned no result"),
    };

    Ok(report(output, &response, "Created", item_type))
}

pub fn edit(output: &Output, args: EditArgs) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    let item_type: ItemType = args.item_type.into();
    let changes = ItemChanges {
        name: args.rename,
        note: args.note,
        flagged: args.flagged,
        due_date: args.due,
        defer_date: args.defer,
        estimated_minutes: args.estimate,
        add_tags: args.add_tags,
        remove_tags: args.remove_tags,
    };
    let query: IdentifierQuery = args.ident.into();
    output.verbose_ctx("edit", &format!("Editing {} {:?}", item_type, query));

    let response = ops::edit(backend.as_mut(), item_type, &query, &changes);
    Ok(report(output, &response, "Updated", item_type))
}

pub fn remove(output: &Output, item_type: ItemType, query: IdentifierQuery) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    output.verbose_ctx("remove", &format!("Removing {} {:?}", item_type, query));
    let response = ops::remove(backend.as_mut(), item_type, &query);

    if let Some(removed) = response.data.as_ref().and_then(|d| d["removed"].as_u64()) {
        output.verbose_ctx("remove", &format!("{} item(s) removed", removed));
    }
    Ok(report(output, &response, "Removed", item_type))
}

pub fn show(output: &Output, item_type: ItemType, query: IdentifierQuery) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    let response = ops::show(backend.as_mut(), item_type, &query);

    if !output.is_json() && response.success {
        if let Some(data) = &response.data {
            output.document(data);
        }
        return Ok(ExitCode::SUCCESS);
    }
    Ok(report(output, &response, "Found", item_type))
}

pub fn move_item(output: &Output, args: MoveArgs) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    let destination = args.destination();
    let query: IdentifierQuery = args.ident.into();
    output.verbose_ctx("move", &format!("Moving task {:?} to {:?}", query, destination));

    let response = ops::move_item(backend.as_mut(), &query, &destination);
    Ok(report(output, &response, "Moved", ItemType::Task))
}

pub fn list(output: &Output, item_type: ItemType) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let mut backend = workspace.backend()?;

    let response = ops::list(backend.as_mut(), item_type);
    if output.is_json() || !response.success {
        return Ok(report(output, &response, "Listed", item_type));
    }

    let entries = response
        .data
        .as_ref()
        .and_then(|d| d.as_array())
        .cloned()
        .unwrap_or_default();

    if entries.is_empty() {
        println!("No {}s", item_type);
    }
    for entry in &entries {
        let id = entry["id"].as_str().unwrap_or_default();
        let name = entry["name"].as_str().unwrap_or_default();
        output.row(&[id, name]);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn bridge_info(output: &Output) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let config = workspace.config();

    if config.project.backend != BackendKind::Bridge {
        output.verbose_ctx("bridge", "Workspace backend is not \"bridge\"; probing anyway");
    }

    let (command, args) = config.bridge_command()?;
    let manifest = BridgeBackend::new(command, args).manifest()?;

    if output.is_json() {
        output.json(&manifest);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", manifest.name, manifest.version);
    if !manifest.description.is_empty() {
        println!("{}", manifest.description);
    }
    for &operation in operations::ALL {
        let mark = if manifest.supports(operation) { "yes" } else { "no" };
        output.row(&[operation, mark]);
    }
    Ok(ExitCode::SUCCESS)
}
