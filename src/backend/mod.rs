//! # Application Backends
//!
//! The seam between taskbridge and the task-management application that
//! actually owns items. Everything behind [`Backend`] is an external
//! collaborator: the batch engine and single-item operations only ever see
//! item IDs, candidate snapshots and failures.
//!
//! ## Implementations
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`StoreBackend`] | Local application emulation over `.taskbridge/items.jsonl` |
//! | [`MemoryBackend`] | In-memory application, used for `--dry-run` and tests |
//! | [`BridgeBackend`] | External bridge executable speaking JSON over stdin/stdout |
//!
//! ## Containment Rules
//!
//! Local backends share one rule set ([`apply_create`], [`apply_move`]):
//! - `projectId` must name an existing project
//! - `parentTaskId` must name an existing task
//! - projects only live at the top level (optionally filed by `folderName`)
//! - a task cannot move into its own subtree

mod bridge;
mod memory;
mod protocol;
mod store;

use chrono::Utc;
use thiserror::Error;

use crate::domain::{Candidate, Containment, Item, ItemChanges, ItemId, ItemType, Properties};

pub use bridge::BridgeBackend;
pub use memory::{Call, MemoryBackend};
pub use protocol::{operations, BridgeManifest, BridgeRequest, BridgeResponse};
pub use store::StoreBackend;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The application answered with an explicit failure
    #[error("{0}")]
    Rejected(String),

    #[error("Application unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response from application: {0}")]
    Protocol(String),
}

impl BackendError {
    pub fn rejected(message: impl Into<String>) -> Self {
        BackendError::Rejected(message.into())
    }
}

/// Operations the application exposes to taskbridge
///
/// Calls are issued strictly one at a time; implementations may assume no
/// overlapping calls from a single caller.
pub trait Backend {
    /// Short name for diagnostics
    fn name(&self) -> &str;

    fn create_task(&mut self, name: &str, properties: &Properties) -> Result<ItemId, BackendError>;

    fn create_project(
        &mut self,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError>;

    /// Snapshot of every item of one type, used for identifier resolution
    fn lookup_candidates(&mut self, item_type: ItemType) -> Result<Vec<Candidate>, BackendError>;

    fn get_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<Item, BackendError>;

    fn edit_item(
        &mut self,
        item_type: ItemType,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<(), BackendError>;

    /// Removes an item and everything it contains, returning the number removed
    fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<usize, BackendError>;

    fn move_item(&mut self, id: &ItemId, destination: &Containment) -> Result<(), BackendError>;

    /// Dispatches a creation on the item type tag
    fn create(
        &mut self,
        item_type: ItemType,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError> {
        match item_type {
            ItemType::Task => self.create_task(name, properties),
            ItemType::Project => self.create_project(name, properties),
        }
    }
}

fn find<'a>(items: &'a [Item], id: &ItemId) -> Option<&'a Item> {
    items.iter().find(|item| &item.id == id)
}

/// Checks that a containment target exists and fits the item type
fn check_containment(
    items: &[Item],
    item_type: ItemType,
    containment: &Containment,
) -> Result<(), BackendError> {
    let (expected, parent_id) = match containment {
        Containment::Inbox => return Ok(()),
        Containment::Project(id) => (ItemType::Project, id),
        Containment::Task(id) => (ItemType::Task, id),
    };

    if item_type == ItemType::Project {
        return Err(BackendError::rejected(format!(
            "Projects cannot be placed inside a {}; use folderName instead",
            expected
        )));
    }

    match find(items, parent_id) {
        Some(parent) if parent.item_type == expected => Ok(()),
        Some(parent) => Err(BackendError::rejected(format!(
            "{} is a {}, not a {}",
            parent_id, parent.item_type, expected
        ))),
        None => Err(BackendError::rejected(format!(
            "{} not found: {}",
            capitalize(expected.label()),
            parent_id
        ))),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validates a creation against existing items and builds the new item
pub fn apply_create(
    items: &[Item],
    item_type: ItemType,
    name: &str,
    properties: &Properties,
) -> Result<Item, BackendError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BackendError::rejected("Name must not be empty"));
    }

    let id = ItemId::mint(item_type, name, Utc::now());
    let item = Item::from_properties(id, item_type, name, properties)
        .map_err(|e| BackendError::rejected(e.to_string()))?;

    check_containment(items, item_type, &item.containment)?;
    if item_type == ItemType::Task && item.folder_name.is_some() {
        return Err(BackendError::rejected("folderName only applies to projects"));
    }

    Ok(item)
}

/// Returns true if `candidate` is `root` or contained (transitively) by it
fn is_within(items: &[Item], root: &ItemId, candidate: &ItemId) -> bool {
    let mut current = Some(candidate.clone());
    let mut hops = 0;
    while let Some(id) = current {
        if &id == root {
            return true;
        }
        // Guards against corrupted stores that already contain a loop
        hops += 1;
        if hops > items.len() {
            return false;
        }
        current = find(items, &id).and_then(|item| item.containment.parent_id().cloned());
    }
    false
}

/// Validates and applies a move in place
pub fn apply_move(
    items: &mut [Item],
    id: &ItemId,
    destination: &Containment,
) -> Result<(), BackendError> {
    let item_type = find(items, id)
        .map(|item| item.item_type)
        .ok_or_else(|| BackendError::rejected(format!("Item not found: {}", id)))?;

    check_containment(items, item_type, destination)?;

    if let Some(target) = destination.parent_id() {
        if is_within(items, id, target) {
            return Err(BackendError::rejected(format!(
                "Cannot move {} into its own subtree",
                id
            )));
        }
    }

    if let Some(item) = items.iter_mut().find(|item| &item.id == id) {
        if &item.containment != destination {
            item.containment = destination.clone();
            item.updated_at = Utc::now();
        }
    }
    Ok(())
}

/// Applies an edit in place
pub fn apply_edit(
    items: &mut [Item],
    item_type: ItemType,
    id: &ItemId,
    changes: &ItemChanges,
) -> Result<(), BackendError> {
    let item = items
        .iter_mut()
        .find(|item| &item.id == id && item.item_type == item_type)
        .ok_or_else(|| {
            BackendError::rejected(format!(
                "{} not found: {}",
                capitalize(item_type.label()),
                id
            ))
        })?;

    if let Some(name) = &changes.name {
        if name.trim().is_empty() {
            return Err(BackendError::rejected("Name must not be empty"));
        }
    }

    item.apply(changes)
        .map_err(|e| BackendError::rejected(e.to_string()))?;
    Ok(())
}

/// Removes an item and all of its descendants, returning how many were removed
pub fn apply_remove(
    items: &mut Vec<Item>,
    item_type: ItemType,
    id: &ItemId,
) -> Result<usize, BackendError> {
    if !items.iter().any(|item| &item.id == id && item.item_type == item_type) {
        return Err(BackendError::rejected(format!(
            "{} not found: {}",
            capitalize(item_type.label()),
            id
        )));
    }

    let doomed: Vec<ItemId> = {
        let all: &[Item] = items;
        all.iter()
            .filter(|item| is_within(all, id, &item.id))
            .map(|item| item.id.clone())
            .collect()
    };

    items.retain(|item| !doomed.contains(&item.id));
    Ok(doomed.len())
}

/// Candidate snapshot for one item type, in storage order
pub fn candidates_of(items: &[Item], item_type: ItemType) -> Vec<Candidate> {
    items
        .iter()
        .filter(|item| item.item_type == item_type)
        .map(Candidate::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Properties {
        serde_json::from_value(value).unwrap()
    }

    fn seeded() -> Vec<Item> {
        let project = Item::new("p-1".parse().unwrap(), ItemType::Project, "Launch");
        let mut task = Item::new("t-1".parse().unwrap(), ItemType::Task, "Plan");
        task.containment = Containment::Project(project.id.clone());
        let mut sub = Item::new("t-2".parse().unwrap(), ItemType::Task, "Draft");
        sub.containment = Containment::Task(task.id.clone());
        vec![project, task, sub]
    }

    #[test]
    fn create_in_existing_project() {
        let items = seeded();
        let item = apply_create(&items, ItemType::Task, "Ship", &props(json!({"projectId": "p-1"}))).unwrap();
        assert_eq!(item.containment, Containment::Project("p-1".parse().unwrap()));
    }

    #[test]
    fn create_rejects_wrong_parent_type() {
        let items = seeded();
        let err = apply_create(&items, ItemType::Task, "X", &props(json!({"projectId": "t-1"}))).unwrap_err();
        assert_eq!(err, BackendError::rejected("t-1 is a task, not a project"));

        let err = apply_create(&items, ItemType::Task, "X", &props(json!({"parentTaskId": "t-404"}))).unwrap_err();
        assert_eq!(err.to_string(), "Task not found: t-404");
    }

    #[test]
    fn projects_cannot_nest() {
        let items = seeded();
        let err = apply_create(&items, ItemType::Project, "Sub", &props(json!({"projectId": "p-1"}))).unwrap_err();
        assert!(err.to_string().contains("Projects cannot be placed inside a project"));

        let ok = apply_create(&items, ItemType::Project, "Filed", &props(json!({"folderName": "Work"}))).unwrap();
        assert_eq!(ok.folder_name.as_deref(), Some("Work"));
    }

    #[test]
    fn create_rejects_blank_name() {
        assert!(apply_create(&[], ItemType::Task, "   ", &Properties::new()).is_err());
    }

    #[test]
    fn move_rejects_own_subtree() {
        let mut items = seeded();
        let err = apply_move(&mut items, &"t-1".parse().unwrap(), &Containment::Task("t-2".parse().unwrap())).unwrap_err();
        assert!(err.to_string().contains("own subtree"));

        let err = apply_move(&mut items, &"t-1".parse().unwrap(), &Containment::Task("t-1".parse().unwrap())).unwrap_err();
        assert!(err.to_string().contains("own subtree"));
    }

    #[test]
    fn move_to_inbox() {
        let mut items = seeded();
        apply_move(&mut items, &"t-2".parse().unwrap(), &Containment::Inbox).unwrap();
        assert!(items[2].containment.is_inbox());
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let mut items = seeded();
        let removed = apply_remove(&mut items, ItemType::Project, &"p-1".parse().unwrap()).unwrap();
        assert_eq!(removed, 3);
        assert!(items.is_empty());
    }

    #[test]
    fn remove_checks_type() {
        let mut items = seeded();
        assert!(apply_remove(&mut items, ItemType::Project, &"t-1".parse().unwrap()).is_err());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn edit_rejects_blank_rename() {
        let mut items = seeded();
        let changes = ItemChanges {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(apply_edit(&mut items, ItemType::Task, &"t-1".parse().unwrap(), &changes).is_err());
    }

    #[test]
    fn candidates_filter_by_type() {
        let items = seeded();
        let tasks = candidates_of(&items, ItemType::Task);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "Plan");
    }
}
