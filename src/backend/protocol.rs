//! Bridge protocol types
//!
//! A bridge executable receives one JSON request line on stdin and answers
//! with one JSON response line on stdout:
//!
//! ```text
//! -> {"operation":"create_task","params":{"name":"Plan","properties":{"projectId":"p-1"}}}
//! <- {"success":true,"data":{"id":"p-1/t-9"}}
//! ```
//!
//! Every bridge must also answer `--manifest` with a [`BridgeManifest`].

use serde::{Deserialize, Serialize};

use crate::domain::{Containment, ItemChanges, ItemId, ItemType, Properties};

use super::BackendError;

/// Operation names understood by bridges
pub mod operations {
    pub const CREATE_TASK: &str = "create_task";
    pub const CREATE_PROJECT: &str = "create_project";
    pub const LIST: &str = "list";
    pub const GET: &str = "get";
    pub const EDIT: &str = "edit";
    pub const REMOVE: &str = "remove";
    pub const MOVE: &str = "move";

    pub const ALL: &[&str] = &[CREATE_TASK, CREATE_PROJECT, LIST, GET, EDIT, REMOVE, MOVE];
}

/// Manifest declaring bridge capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeManifest {
    /// Bridge name (e.g., "taskbridge-omnifocus")
    pub name: String,

    pub version: String,

    /// Human-readable description of the target application
    #[serde(default)]
    pub description: String,

    pub operations: Vec<String>,
}

impl BridgeManifest {
    pub fn supports(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| op == operation)
    }
}

/// One request line sent to a bridge
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "operation", content = "params", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    CreateTask {
        name: &'a str,
        properties: &'a Properties,
    },
    CreateProject {
        name: &'a str,
        properties: &'a Properties,
    },
    List {
        #[serde(rename = "type")]
        item_type: ItemType,
    },
    Get {
        #[serde(rename = "type")]
        item_type: ItemType,
        id: &'a ItemId,
    },
    Edit {
        #[serde(rename = "type")]
        item_type: ItemType,
        id: &'a ItemId,
        changes: &'a ItemChanges,
    },
    Remove {
        #[serde(rename = "type")]
        item_type: ItemType,
        id: &'a ItemId,
    },
    Move {
        id: &'a ItemId,
        destination: &'a Containment,
    },
}

impl<'a> BridgeRequest<'a> {
    /// Creation request for the given item type
    pub fn create(item_type: ItemType, name: &'a str, properties: &'a Properties) -> Self {
        match item_type {
            ItemType::Task => BridgeRequest::CreateTask { name, properties },
            ItemType::Project => BridgeRequest::CreateProject { name, properties },
        }
    }

    /// Wire name of the operation
    pub fn operation(&self) -> &'static str {
        match self {
            BridgeRequest::CreateTask { .. } => operations::CREATE_TASK,
            BridgeRequest::CreateProject { .. } => operations::CREATE_PROJECT,
            BridgeRequest::List { .. } => operations::LIST,
            BridgeRequest::Get { .. } => operations::GET,
            BridgeRequest::Edit { .. } => operations::EDIT,
            BridgeRequest::Remove { .. } => operations::REMOVE,
            BridgeRequest::Move { .. } => operations::MOVE,
        }
    }
}

/// One response line read from a bridge
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    /// Failure message, reported verbatim
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeResponse {
    /// Converts the response into the payload or a rejection
    pub fn into_result(self, operation: &str) -> Result<serde_json::Value, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.error.unwrap_or_else(|| {
                format!("bridge reported failure for '{}'", operation)
            })));
        }
        Ok(self.data.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_supports() {
        let manifest: BridgeManifest = serde_json::from_str(
            r#"{"name":"taskbridge-test","version":"0.1.0","operations":["create_task","list"]}"#,
        )
        .unwrap();

        assert!(manifest.supports(operations::CREATE_TASK));
        assert!(!manifest.supports(operations::MOVE));
        assert!(manifest.description.is_empty());
    }

    #[test]
    fn create_request_wire_shape() {
        let mut properties = Properties::new();
        properties.set("projectId", "p-1");
        let request = BridgeRequest::create(ItemType::Task, "Plan", &properties);

        assert_eq!(request.operation(), operations::CREATE_TASK);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "operation": "create_task",
                "params": { "name": "Plan", "properties": { "projectId": "p-1" } }
            })
        );
    }

    #[test]
    fn list_request_names_the_type() {
        let request = BridgeRequest::List {
            item_type: ItemType::Project,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "operation": "list", "params": { "type": "project" } })
        );
    }

    #[test]
    fn failure_without_message_names_operation() {
        let response: BridgeResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        let err = response.into_result(operations::REMOVE).unwrap_err();
        assert_eq!(
            err,
            BackendError::Rejected("bridge reported failure for 'remove'".to_string())
        );
    }

    #[test]
    fn success_without_data_is_null() {
        let response: BridgeResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(response.into_result(operations::EDIT).unwrap(), serde_json::Value::Null);
    }
}
