//! Sequential creation dispatch
//!
//! Issues one backend call per scheduled position, substituting the real ID
//! of an already-created parent into the property bag first. Backend
//! failures and panics are both turned into a per-position outcome; nothing
//! here aborts the rest of the batch.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::backend::Backend;
use crate::domain::{keys, Containment, ErrorKind, ItemId, ItemType, Properties, TempId};

use super::request::BatchItemRequest;
use super::result::{ItemOutcome, Outcomes};

/// A created item a later request may name as its parent
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub id: ItemId,
    pub item_type: ItemType,
}

/// tempId → real ID for one batch call
///
/// Filled only by successful creations and dropped with the batch.
#[derive(Debug, Default)]
pub struct TempIdRegistry {
    entries: HashMap<TempId, Registered>,
}

impl TempIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, temp_id: TempId, id: ItemId, item_type: ItemType) {
        self.entries.insert(temp_id, Registered { id, item_type });
    }

    pub fn get(&self, temp_id: &TempId) -> Option<&Registered> {
        self.entries.get(temp_id)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Properties forwarded for a child, pointing at its freshly created parent
///
/// Any containment the caller put in the bag is replaced: the batch parent
/// always wins.
pub fn with_parent(properties: &Properties, parent: &Registered) -> Properties {
    let mut forwarded = properties.clone();
    forwarded.remove(keys::PROJECT_ID);
    forwarded.remove(keys::PARENT_TASK_ID);
    forwarded.set(
        Containment::key_for(parent.item_type),
        parent.id.as_str().to_string(),
    );
    forwarded
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct Dispatcher<'a> {
    backend: &'a mut dyn Backend,
    registry: TempIdRegistry,
    calls: usize,
}

impl<'a> Dispatcher<'a> {
    pub fn new(backend: &'a mut dyn Backend) -> Self {
        Self {
            backend,
            registry: TempIdRegistry::new(),
            calls: 0,
        }
    }

    /// Number of backend creation calls issued so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    #[cfg(test)]
    pub fn registry(&self) -> &TempIdRegistry {
        &self.registry
    }

    /// Settles one scheduled position
    pub fn dispatch(&mut self, position: usize, request: &BatchItemRequest, outcomes: &mut Outcomes) {
        let outcome = self.create(position, request);
        outcomes.record(position, outcome);
    }

    fn create(&mut self, position: usize, request: &BatchItemRequest) -> ItemOutcome {
        let properties = match &request.parent_temp_id {
            None => request.properties.clone(),
            Some(parent_temp_id) => match self.registry.get(parent_temp_id) {
                Some(parent) => with_parent(&request.properties, parent),
                None => {
                    tracing::debug!(position, parent = %parent_temp_id, "skipping item whose parent failed");
                    return ItemOutcome::failed(
                        ErrorKind::DependencyFailed,
                        format!(
                            "parent creation failed: item with tempId '{}' was not created",
                            parent_temp_id
                        ),
                    );
                }
            },
        };

        let name = request.name.trim();
        let item_type = request.item_type;

        tracing::debug!(position, %item_type, name, backend = self.backend.name(), "creating item");
        self.calls += 1;

        let backend = &mut *self.backend;
        let result = catch_unwind(AssertUnwindSafe(|| {
            backend.create(item_type, name, &properties)
        }));

        match result {
            Ok(Ok(id)) => {
                if let Some(temp_id) = &request.temp_id {
                    self.registry.register(temp_id.clone(), id.clone(), item_type);
                }
                ItemOutcome::Created(id)
            }
            Ok(Err(err)) => {
                tracing::warn!(position, name, error = %err, "creation failed");
                ItemOutcome::failed(ErrorKind::Creation, err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(position, name, panic = %message, "creation call panicked");
                ItemOutcome::failed(
                    ErrorKind::Creation,
                    format!("external call panicked: {}", message),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;

    #[test]
    fn parent_id_substituted_for_task_parent() {
        let parent = Registered {
            id: "t-abc".parse().unwrap(),
            item_type: ItemType::Task,
        };
        let mut props = Properties::new();
        props.set("projectId", "p-caller");
        props.set("note", "keep me");

        let forwarded = with_parent(&props, &parent);

        assert_eq!(forwarded.get("parentTaskId"), Some(&json!("t-abc")));
        assert!(!forwarded.contains("projectId"));
        assert_eq!(forwarded.get("note"), Some(&json!("keep me")));
    }

    #[test]
    fn parent_id_substituted_for_project_parent() {
        let parent = Registered {
            id: "p-abc".parse().unwrap(),
            item_type: ItemType::Project,
        };
        let forwarded = with_parent(&Properties::new(), &parent);
        assert_eq!(forwarded.get("projectId"), Some(&json!("p-abc")));
    }

    #[test]
    fn success_registers_temp_id() {
        let mut backend = MemoryBackend::new();
        let mut outcomes = Outcomes::new(1);
        let mut dispatcher = Dispatcher::new(&mut backend);

        let request = BatchItemRequest::project("Launch").with_temp_id("p");
        dispatcher.dispatch(0, &request, &mut outcomes);

        let id = outcomes.get(0).unwrap().created_id().unwrap().clone();
        let registered = dispatcher.registry().get(&"p".parse().unwrap()).unwrap();
        assert_eq!(registered.id, id);
        assert_eq!(registered.item_type, ItemType::Project);
        assert_eq!(dispatcher.calls(), 1);
    }

    #[test]
    fn unregistered_parent_fails_without_call() {
        let mut backend = MemoryBackend::new();
        let mut outcomes = Outcomes::new(1);
        let mut dispatcher = Dispatcher::new(&mut backend);

        dispatcher.dispatch(0, &BatchItemRequest::task("Orphan").with_parent("p"), &mut outcomes);

        assert_eq!(dispatcher.calls(), 0);
        match outcomes.get(0).unwrap() {
            ItemOutcome::Failed { kind, message } => {
                assert_eq!(*kind, ErrorKind::DependencyFailed);
                assert!(message.contains("parent creation failed"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn rejection_recorded_verbatim() {
        let mut backend = MemoryBackend::new();
        backend.reject("Bad", "Project is on hold");
        let mut outcomes = Outcomes::new(1);
        let mut dispatcher = Dispatcher::new(&mut backend);

        let request = BatchItemRequest::task("Bad").with_temp_id("b");
        dispatcher.dispatch(0, &request, &mut outcomes);

        assert_eq!(
            outcomes.get(0),
            Some(&ItemOutcome::failed(ErrorKind::Creation, "Project is on hold"))
        );
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn panic_becomes_failure() {
        let mut backend = MemoryBackend::new();
        backend.panic_on("Boom", "automation crashed");
        let mut outcomes = Outcomes::new(2);
        let mut dispatcher = Dispatcher::new(&mut backend);

        dispatcher.dispatch(0, &BatchItemRequest::task("Boom"), &mut outcomes);
        dispatcher.dispatch(1, &BatchItemRequest::task("Fine"), &mut outcomes);

        assert_eq!(
            outcomes.get(0),
            Some(&ItemOutcome::failed(
                ErrorKind::Creation,
                "external call panicked: automation crashed"
            ))
        );
        assert!(outcomes.get(1).unwrap().is_success());
    }
}
