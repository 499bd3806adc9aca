//! Single-item operations
//!
//! Every operation identifies its target with an [`IdentifierQuery`],
//! resolves it against a fresh candidate snapshot from the backend, then
//! issues exactly one mutating call. Failures never escape as errors: they
//! become an [`OperationResponse`] with the shared error vocabulary.

mod response;

use crate::backend::{Backend, BackendError};
use crate::domain::{
    resolve, Candidate, Containment, ErrorKind, IdentifierQuery, ItemChanges, ItemType,
    ResolveError,
};

pub use response::OperationResponse;

/// Where `move_item` should put the target
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Inbox,
    Project(IdentifierQuery),
    Task(IdentifierQuery),
}

impl From<ResolveError> for OperationResponse {
    fn from(err: ResolveError) -> Self {
        OperationResponse::failure(err.kind(), err.to_string())
            .with_code(err.code())
            .with_matching_ids(err.matching_ids())
    }
}

impl From<BackendError> for OperationResponse {
    fn from(err: BackendError) -> Self {
        OperationResponse::failure(ErrorKind::Application, err.to_string())
    }
}

fn locate(
    backend: &mut dyn Backend,
    item_type: ItemType,
    query: &IdentifierQuery,
) -> Result<Candidate, OperationResponse> {
    if query.is_empty() {
        return Err(ResolveError::MissingIdentifier(item_type).into());
    }
    let candidates = backend.lookup_candidates(item_type)?;
    Ok(resolve(item_type, query, &candidates)?)
}

/// Applies field edits to one task or project
pub fn edit(
    backend: &mut dyn Backend,
    item_type: ItemType,
    query: &IdentifierQuery,
    changes: &ItemChanges,
) -> OperationResponse {
    let target = match locate(backend, item_type, query) {
        Ok(target) => target,
        Err(response) => return response,
    };

    if changes.is_empty() {
        return OperationResponse::failure(ErrorKind::Validation, "No changes specified");
    }

    tracing::debug!(id = %target.id, %item_type, "editing item");
    match backend.edit_item(item_type, &target.id, changes) {
        Ok(()) => OperationResponse::ok(target.id),
        Err(err) => err.into(),
    }
}

/// Removes one task or project together with everything it contains
pub fn remove(
    backend: &mut dyn Backend,
    item_type: ItemType,
    query: &IdentifierQuery,
) -> OperationResponse {
    let target = match locate(backend, item_type, query) {
        Ok(target) => target,
        Err(response) => return response,
    };

    tracing::debug!(id = %target.id, %item_type, "removing item");
    match backend.remove_item(item_type, &target.id) {
        Ok(removed) => OperationResponse::ok(target.id).with_data(serde_json::json!({
            "removed": removed,
        })),
        Err(err) => err.into(),
    }
}

/// Moves a task into a project, under another task, or back to the inbox
pub fn move_item(
    backend: &mut dyn Backend,
    query: &IdentifierQuery,
    destination: &Destination,
) -> OperationResponse {
    let target = match locate(backend, ItemType::Task, query) {
        Ok(target) => target,
        Err(response) => return response,
    };

    let containment = match destination {
        Destination::Inbox => Containment::Inbox,
        Destination::Project(parent) => match locate(backend, ItemType::Project, parent) {
            Ok(project) => Containment::Project(project.id),
            Err(response) => return response,
        },
        Destination::Task(parent) => match locate(backend, ItemType::Task, parent) {
            Ok(task) => Containment::Task(task.id),
            Err(response) => return response,
        },
    };

    tracing::debug!(id = %target.id, to = %containment, "moving item");
    match backend.move_item(&target.id, &containment) {
        Ok(()) => OperationResponse::ok(target.id),
        Err(err) => err.into(),
    }
}

/// Returns the resolved item's full details
pub fn show(
    backend: &mut dyn Backend,
    item_type: ItemType,
    query: &IdentifierQuery,
) -> OperationResponse {
    let target = match locate(backend, item_type, query) {
        Ok(target) => target,
        Err(response) => return response,
    };

    let item = match backend.get_item(item_type, &target.id) {
        Ok(item) => item,
        Err(err) => return err.into(),
    };

    match serde_json::to_value(&item) {
        Ok(data) => OperationResponse::ok(target.id).with_data(data),
        Err(err) => OperationResponse::failure(ErrorKind::Application, err.to_string()),
    }
}

/// Lists every item of one type as `{id, name}` pairs
pub fn list(backend: &mut dyn Backend, item_type: ItemType) -> OperationResponse {
    match backend.lookup_candidates(item_type) {
        Ok(candidates) => {
            let data: Vec<serde_json::Value> = candidates
                .iter()
                .map(|c| serde_json::json!({ "id": c.id, "name": c.name }))
                .collect();
            OperationResponse::success().with_data(serde_json::Value::Array(data))
        }
        Err(err) => err.into(),
    }
}
