//! # Batch Hierarchical Creation
//!
//! Creates an ordered list of items in one call, where items may name other
//! items of the same batch as their parent through a caller-chosen `tempId`.
//!
//! ## Pipeline
//!
//! 1. **Validate**: non-array, empty, blank names and duplicate `tempId`s
//!    reject the whole batch before any external call.
//! 2. **Graph**: positions become nodes; `parentTempId` edges point from
//!    parent to child. Unresolved references fail their position alone.
//! 3. **Cycles**: positions on a cycle, and everything below one, fail.
//! 4. **Schedule**: parents before children, ties by input index.
//! 5. **Dispatch**: one backend call at a time; a failed parent fails its
//!    children without a call.
//! 6. **Aggregate**: one result per input position, in input order.

mod dispatch;
mod graph;
mod request;
mod result;
mod schedule;

use serde_json::Value;

use crate::backend::Backend;
use crate::domain::ErrorKind;

pub use dispatch::{with_parent, Dispatcher, Registered, TempIdRegistry};
pub use graph::{CyclePartition, TempIdGraph, UnknownReference};
pub use request::{parse_requests, validate, BatchError, BatchItemRequest};
pub use result::{BatchItemResult, BatchResponse, ItemOutcome, Outcomes};
pub use schedule::schedule;

/// Runs batches against one backend
pub struct BatchEngine<'a> {
    backend: &'a mut dyn Backend,
}

impl<'a> BatchEngine<'a> {
    pub fn new(backend: &'a mut dyn Backend) -> Self {
        Self { backend }
    }

    /// Parses raw JSON input and runs it
    pub fn run_json(&mut self, input: &Value) -> BatchResponse {
        match parse_requests(input) {
            Ok(requests) => self.run(&requests),
            Err(err) => {
                tracing::warn!(error = %err, "batch rejected");
                BatchResponse::rejected(&err)
            }
        }
    }

    /// Runs a batch, returning one result per request in input order
    pub fn run(&mut self, requests: &[BatchItemRequest]) -> BatchResponse {
        if let Err(err) = validate(requests) {
            tracing::warn!(error = %err, "batch rejected");
            return BatchResponse::rejected(&err);
        }

        let mut outcomes = Outcomes::new(requests.len());
        let graph = TempIdGraph::build(requests);

        for unknown in graph.unknown_references() {
            outcomes.record(
                unknown.position,
                ItemOutcome::failed(
                    ErrorKind::UnknownReference,
                    format!(
                        "unknown parentTempId '{}': no item in this batch declares that tempId",
                        unknown.parent_temp_id
                    ),
                ),
            );
        }

        let cycles = graph.find_cycles();
        for &position in &cycles.on_cycle {
            let temp_id = requests[position]
                .temp_id
                .as_ref()
                .map(|t| t.as_str())
                .unwrap_or_default();
            outcomes.record(
                position,
                ItemOutcome::failed(
                    ErrorKind::Cycle,
                    format!("cycle detected involving tempId '{}'", temp_id),
                ),
            );
        }
        for &position in &cycles.below_cycle {
            let parent = requests[position]
                .parent_temp_id
                .as_ref()
                .map(|t| t.as_str())
                .unwrap_or_default();
            outcomes.record(
                position,
                ItemOutcome::failed(
                    ErrorKind::Cycle,
                    format!(
                        "cycle detected: parent '{}' depends on a cycle of parent references",
                        parent
                    ),
                ),
            );
        }

        let excluded: Vec<bool> = (0..requests.len()).map(|p| outcomes.is_settled(p)).collect();
        let order = schedule(&graph, &excluded);

        tracing::debug!(
            items = requests.len(),
            scheduled = order.len(),
            unknown = graph.unknown_references().len(),
            cyclic = cycles.on_cycle.len() + cycles.below_cycle.len(),
            "batch planned"
        );

        let mut dispatcher = Dispatcher::new(&mut *self.backend);
        for position in order {
            dispatcher.dispatch(position, &requests[position], &mut outcomes);
        }
        let calls = dispatcher.calls();

        let response = BatchResponse::from_results(outcomes.into_results());
        tracing::info!(
            created = response.created_count(),
            failed = response.failed_count(),
            calls,
            "batch finished"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::domain::{Containment, ItemType};
    use serde_json::json;

    fn run(backend: &mut MemoryBackend, input: Value) -> BatchResponse {
        BatchEngine::new(backend).run_json(&input)
    }

    fn kinds(response: &BatchResponse) -> Vec<Option<ErrorKind>> {
        response.results.iter().map(|r| r.error_kind).collect()
    }

    #[test]
    fn parent_and_child_created() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "tempId": "p", "name": "Parent" },
                { "type": "task", "parentTempId": "p", "name": "Child" }
            ]),
        );

        assert!(response.success);
        assert!(response.results.iter().all(|r| r.success));

        let parent_id = response.results[0].id.clone().unwrap();
        let child = backend.item_named("Child").unwrap();
        assert_eq!(child.containment, Containment::Task(parent_id));
    }

    #[test]
    fn two_item_cycle_makes_no_calls() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "A", "tempId": "a", "parentTempId": "b" },
                { "type": "task", "name": "B", "tempId": "b", "parentTempId": "a" }
            ]),
        );

        assert!(!response.success);
        assert_eq!(kinds(&response), vec![Some(ErrorKind::Cycle); 2]);
        assert!(response.results[0].error.as_ref().unwrap().contains("cycle"));
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn unknown_parent_fails_alone() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([{ "type": "task", "name": "Lost", "parentTempId": "missing" }]),
        );

        assert!(!response.success);
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0]
            .error
            .as_ref()
            .unwrap()
            .contains("unknown parentTempId"));
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn partial_success_with_unknown_parent() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Valid" },
                { "type": "task", "name": "Bad", "parentTempId": "missing" }
            ]),
        );

        assert!(response.success);
        assert!(response.results[0].success);
        assert!(!response.results[1].success);
        assert_eq!(response.results[1].error_kind, Some(ErrorKind::UnknownReference));
    }

    #[test]
    fn empty_batch_is_validation_error() {
        let mut backend = MemoryBackend::new();
        let response = run(&mut backend, json!([]));

        assert!(!response.success);
        assert!(response.results.is_empty());
        assert!(response.error.unwrap().contains("empty"));
    }

    #[test]
    fn non_array_is_validation_error() {
        let mut backend = MemoryBackend::new();
        let response = run(&mut backend, json!({ "type": "task", "name": "x" }));

        assert!(!response.success);
        assert!(response.results.is_empty());
        assert!(response.error.is_some());
    }

    #[test]
    fn duplicate_temp_id_rejects_batch() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "A", "tempId": "x" },
                { "type": "task", "name": "B", "tempId": "x" }
            ]),
        );

        assert!(!response.success);
        assert!(response.results.is_empty());
        assert!(response.error.unwrap().contains("duplicate tempId"));
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn failed_parent_cascades_without_calls() {
        let mut backend = MemoryBackend::new();
        backend.reject("Parent", "automation error");

        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Parent", "tempId": "p" },
                { "type": "task", "name": "Child", "tempId": "c", "parentTempId": "p" },
                { "type": "task", "name": "Grandchild", "parentTempId": "c" },
                { "type": "task", "name": "Sibling" }
            ]),
        );

        assert!(response.success);
        assert_eq!(
            kinds(&response),
            vec![
                Some(ErrorKind::Creation),
                Some(ErrorKind::DependencyFailed),
                Some(ErrorKind::DependencyFailed),
                None
            ]
        );
        assert_eq!(response.results[0].error.as_deref(), Some("automation error"));
        assert_eq!(backend.created_names(), vec!["Parent", "Sibling"]);
    }

    #[test]
    fn children_of_unknown_reference_cascade() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Broken", "tempId": "b", "parentTempId": "nowhere" },
                { "type": "task", "name": "Below", "parentTempId": "b" }
            ]),
        );

        assert_eq!(
            kinds(&response),
            vec![Some(ErrorKind::UnknownReference), Some(ErrorKind::DependencyFailed)]
        );
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn cycle_descendants_fail_but_siblings_run() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Self", "tempId": "s", "parentTempId": "s" },
                { "type": "task", "name": "Below self", "parentTempId": "s" },
                { "type": "task", "name": "Free" }
            ]),
        );

        assert_eq!(
            kinds(&response),
            vec![Some(ErrorKind::Cycle), Some(ErrorKind::Cycle), None]
        );
        assert!(response.results[0].error.as_ref().unwrap().contains("'s'"));
        assert_eq!(backend.created_names(), vec!["Free"]);
    }

    #[test]
    fn calls_follow_dependency_order() {
        let mut backend = MemoryBackend::new();
        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Sub", "parentTempId": "t" },
                { "type": "task", "name": "Task", "tempId": "t", "parentTempId": "proj" },
                { "type": "project", "name": "Project", "tempId": "proj", "folderName": "Work" },
                { "type": "task", "name": "Inbox" }
            ]),
        );

        assert!(response.results.iter().all(|r| r.success));
        assert_eq!(backend.created_names(), vec!["Project", "Task", "Sub", "Inbox"]);

        let project = backend.item_named("Project").unwrap().id.clone();
        let task = backend.item_named("Task").unwrap();
        assert_eq!(task.containment, Containment::Project(project));
        assert_eq!(backend.item_named("Project").unwrap().item_type, ItemType::Project);
    }

    #[test]
    fn backend_panic_is_isolated() {
        let mut backend = MemoryBackend::new();
        backend.panic_on("Crash", "script exploded");

        let response = run(
            &mut backend,
            json!([
                { "type": "task", "name": "Crash", "tempId": "c" },
                { "type": "task", "name": "Under crash", "parentTempId": "c" },
                { "type": "task", "name": "Survivor" }
            ]),
        );

        assert!(response.success);
        assert!(response.results[0]
            .error
            .as_ref()
            .unwrap()
            .contains("script exploded"));
        assert_eq!(response.results[1].error_kind, Some(ErrorKind::DependencyFailed));
        assert!(response.results[2].success);
    }

    #[test]
    fn hierarchy_level_does_not_affect_order() {
        let mut backend = MemoryBackend::new();
        run(
            &mut backend,
            json!([
                { "type": "task", "name": "Deep", "hierarchyLevel": 0 },
                { "type": "task", "name": "Shallow", "hierarchyLevel": 5 }
            ]),
        );
        assert_eq!(backend.created_names(), vec!["Deep", "Shallow"]);
    }
}
