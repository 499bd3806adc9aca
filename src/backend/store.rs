//! Local store backend
//!
//! Emulates the application on top of the workspace JSONL item store, so the
//! whole pipeline can run without an external bridge.

use crate::domain::{Candidate, Containment, Item, ItemChanges, ItemId, ItemType, Properties};
use crate::storage::ItemStore;

use super::{apply_create, apply_edit, apply_move, apply_remove, candidates_of, Backend, BackendError};

pub struct StoreBackend {
    store: ItemStore,
}

fn storage_error(err: anyhow::Error) -> BackendError {
    BackendError::Unavailable(format!("{:#}", err))
}

impl StoreBackend {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<Item>, BackendError> {
        self.store.read_all().map_err(storage_error)
    }

    /// Applies a change under the store's write lock; rejections write nothing
    fn update<T>(
        &self,
        apply: impl FnOnce(&mut Vec<Item>) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        self.store.update(apply).map_err(storage_error)?
    }

    fn create_item(
        &mut self,
        item_type: ItemType,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError> {
        self.update(|items| {
            let item = apply_create(items, item_type, name, properties)?;
            let id = item.id.clone();
            items.push(item);
            Ok(id)
        })
    }
}

impl Backend for StoreBackend {
    fn name(&self) -> &str {
        "store"
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
        Ok(candidates_of(&self.load()?, item_type))
    }

    fn get_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<Item, BackendError> {
        self.load()?
            .into_iter()
            .find(|item| &item.id == id && item.item_type == item_type)
            .ok_or_else(|| BackendError::rejected(format!("Item not found: {}", id)))
    }

    fn edit_item(
        &mut self,
        item_type: ItemType,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<(), BackendError> {
        self.update(|items| apply_edit(items, item_type, id, changes))
    }

    fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<usize, BackendError> {
        self.update(|items| apply_remove(items, item_type, id))
    }

    fn move_item(&mut self, id: &ItemId, destination: &Containment) -> Result<(), BackendError> {
        self.update(|items| apply_move(items, id, destination))
    }
}
