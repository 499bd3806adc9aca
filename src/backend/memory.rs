//! In-memory application backend
//!
//! Holds items in a `Vec` and records every call it receives. Used for
//! `batch --dry-run` (seeded from the workspace snapshot) and as a test
//! double where the number and order of external calls matter.

use std::collections::HashMap;

use crate::domain::{Candidate, Containment, Item, ItemChanges, ItemId, ItemType, Properties};

use super::{apply_create, apply_edit, apply_move, apply_remove, candidates_of, Backend, BackendError};

/// A call received by the backend, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        item_type: ItemType,
        name: String,
        properties: Properties,
    },
    Lookup(ItemType),
    Get(ItemId),
    Edit(ItemId),
    Remove(ItemId),
    Move(ItemId, Containment),
}

/// Scripted misbehaviour for a named creation
#[derive(Debug, Clone)]
enum Fault {
    Reject(String),
    Panic(String),
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Vec<Item>,
    calls: Vec<Call>,
    faults: HashMap<String, Fault>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with existing items
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Makes every creation of an item with this name fail with `message`
    pub fn reject(&mut self, name: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.faults.insert(name.into(), Fault::Reject(message.into()));
        self
    }

    /// Makes every creation of an item with this name panic
    pub fn panic_on(&mut self, name: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.faults.insert(name.into(), Fault::Panic(message.into()));
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Names passed to creation calls, in call order
    pub fn created_names(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Create { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of creation calls received
    pub fn create_calls(&self) -> usize {
        self.created_names().len()
    }

    /// Looks up a stored item by name
    pub fn item_named(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    fn create_item(
        &mut self,
        item_type: ItemType,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError> {
        self.calls.push(Call::Create {
            item_type,
            name: name.to_string(),
            properties: properties.clone(),
        });

        match self.faults.get(name) {
            Some(Fault::Reject(message)) => return Err(BackendError::Rejected(message.clone())),
            Some(Fault::Panic(message)) => panic!("{}", message),
            None => {}
        }

        let item = apply_create(&self.items, item_type, name, properties)?;
        let id = item.id.clone();
        self.items.push(item);
        Ok(id)
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_task(&mut self, name: &str, properties: &Properties) -> Result<ItemId, BackendError> {
        self.create_item(ItemType::Task, name, properties)
    }

    fn create_project(
        &mut self,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError> {
        self.create_item(ItemType::Project, name, properties)
    }

    fn lookup_candidates(&mut self, item_type: ItemType) -> Result<Vec<Candidate>, BackendError> {
        self.calls.push(Call::Lookup(item_type));
        Ok(candidates_of(&self.items, item_type))
    }

    fn get_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<Item, BackendError> {
        self.calls.push(Call::Get(id.clone()));
        self.items
            .iter()
            .find(|item| &item.id == id && item.item_type == item_type)
            .cloned()
            .ok_or_else(|| BackendError::rejected(format!("Item not found: {}", id)))
    }

    fn edit_item(
        &mut self,
        item_type: ItemType,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<(), BackendError> {
        self.calls.push(Call::Edit(id.clone()));
        apply_edit(&mut self.items, item_type, id, changes)
    }

    fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<usize, BackendError> {
        self.calls.push(Call::Remove(id.clone()));
        apply_remove(&mut self.items, item_type, id)
    }

    fn move_item(&mut self, id: &ItemId, destination: &Containment) -> Result<(), BackendError> {
        self.calls.push(Call::Move(id.clone(), destination.clone()));
        apply_move(&mut self.items, id, destination)
    }
}
