//! Batch creation requests and whole-batch validation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ItemType, Properties, TempId};

/// Failures that reject a batch before anything is sent to the application
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BatchError {
    #[error("batch input is not valid {format}: {message}")]
    Unparseable {
        format: &'static str,
        message: String,
    },

    #[error("batch input must be an array of items")]
    NotAnArray,

    #[error("batch is empty: at least one item is required")]
    Empty,

    #[error("item {index} is malformed: {message}")]
    Malformed { index: usize, message: String },

    #[error("item {index}: name must not be empty")]
    BlankName { index: usize },

    #[error("duplicate tempId '{temp_id}' declared by items {first} and {second}")]
    DuplicateTempId {
        temp_id: TempId,
        first: usize,
        second: usize,
    },
}

/// One "create an item" request inside a batch
///
/// Any field other than the ones below is collected into `properties` and
/// forwarded to the application untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemRequest {
    #[serde(rename = "type", alias = "itemType")]
    pub item_type: ItemType,

    pub name: String,

    /// Lets later requests in the same batch name this item as their parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<TempId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_temp_id: Option<TempId>,

    /// Caller hint only; execution order comes from `parent_temp_id` edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u32>,

    #[serde(flatten)]
    pub properties: Properties,
}

impl BatchItemRequest {
    pub fn new(item_type: ItemType, name: impl Into<String>) -> Self {
        Self {
            item_type,
            name: name.into(),
            temp_id: None,
            parent_temp_id: None,
            hierarchy_level: None,
            properties: Properties::new(),
        }
    }

    pub fn task(name: impl Into<String>) -> Self {
        Self::new(ItemType::Task, name)
    }

    pub fn project(name: impl Into<String>) -> Self {
        Self::new(ItemType::Project, name)
    }

    /// Sets the temp ID; blank values leave the request without one
    pub fn with_temp_id(mut self, temp_id: &str) -> Self {
        self.temp_id = temp_id.parse().ok();
        self
    }

    /// Sets the parent temp ID; blank values leave the request without one
    pub fn with_parent(mut self, parent_temp_id: &str) -> Self {
        self.parent_temp_id = parent_temp_id.parse().ok();
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.set(key, value);
        self
    }
}

/// Parses raw JSON into requests, rejecting anything that is not an array
pub fn parse_requests(input: &Value) -> Result<Vec<BatchItemRequest>, BatchError> {
    let items = input.as_array().ok_or(BatchError::NotAnArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value(raw.clone()).map_err(|e| BatchError::Malformed {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Checks the whole batch before any graph work happens
pub fn validate(requests: &[BatchItemRequest]) -> Result<(), BatchError> {
    if requests.is_empty() {
        return Err(BatchError::Empty);
    }

    let mut declared: HashMap<&TempId, usize> = HashMap::new();

    for (index, request) in requests.iter().enumerate() {
        if request.name.trim().is_empty() {
            return Err(BatchError::BlankName { index });
        }

        if let Some(temp_id) = &request.temp_id {
            if let Some(first) = declared.insert(temp_id, index) {
                return Err(BatchError::DuplicateTempId {
                    temp_id: temp_id.clone(),
                    first,
                    second: index,
                });
            }
        }
    }

    Ok(())
}
