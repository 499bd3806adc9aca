//! Per-position outcomes and the caller-facing batch response

use serde::{Deserialize, Serialize};

use crate::domain::{ErrorKind, ItemId};

use super::request::BatchError;

/// Terminal outcome for one batch position
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Created(ItemId),
    Failed { kind: ErrorKind, message: String },
}

impl ItemOutcome {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        ItemOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Created(_))
    }

    pub fn created_id(&self) -> Option<&ItemId> {
        match self {
            ItemOutcome::Created(id) => Some(id),
            ItemOutcome::Failed { .. } => None,
        }
    }
}

/// Outcome slots indexed by original batch position
///
/// Each slot is written at most once; later writes are ignored so the first
/// terminal outcome for a position sticks.
#[derive(Debug)]
pub struct Outcomes {
    slots: Vec<Option<ItemOutcome>>,
}

impl Outcomes {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Records an outcome; returns false if the position was already settled
    pub fn record(&mut self, position: usize, outcome: ItemOutcome) -> bool {
        match self.slots.get_mut(position) {
            Some(slot @ None) => {
                *slot = Some(outcome);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, position: usize) -> Option<&ItemOutcome> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub fn is_settled(&self, position: usize) -> bool {
        self.get(position).is_some()
    }

    /// Positions without an outcome yet
    #[cfg(test)]
    pub fn unsettled(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&p| !self.is_settled(p))
            .collect()
    }

    /// Converts slots into results in original order
    pub fn into_results(self) -> Vec<BatchItemResult> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(ItemOutcome::Created(id)) => BatchItemResult::created(index, id),
                Some(ItemOutcome::Failed { kind, message }) => {
                    BatchItemResult::failed(index, kind, message)
                }
                None => BatchItemResult::failed(
                    index,
                    ErrorKind::DependencyFailed,
                    "item was never scheduled",
                ),
            })
            .collect()
    }
}

/// Result for one input position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub index: usize,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl BatchItemResult {
    pub fn created(index: usize, id: ItemId) -> Self {
        Self {
            index,
            success: true,
            id: Some(id),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(index: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            id: None,
            error: Some(message.into()),
            error_kind: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Caller-facing response for a whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// True when at least one position succeeded
    pub success: bool,

    /// One entry per input position, in input order
    pub results: Vec<BatchItemResult>,

    /// Only set when the whole batch was rejected before dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    pub fn from_results(results: Vec<BatchItemResult>) -> Self {
        Self {
            success: results.iter().any(BatchItemResult::is_success),
            results,
            error: None,
        }
    }

    /// Whole-batch validation failure: no results, nothing dispatched
    pub fn rejected(error: &BatchError) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn created_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.created_count()
    }
}
