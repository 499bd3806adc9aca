use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ErrorKind, ItemId};

/// Result shape shared by every single-item operation
///
/// Ambiguous name lookups carry `code: "DISAMBIGUATION_REQUIRED"` and the
/// IDs the caller can retry with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matching_ids: Vec<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OperationResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            id: None,
            error: None,
            error_kind: None,
            code: None,
            matching_ids: Vec::new(),
            data: None,
        }
    }

    pub fn ok(id: ItemId) -> Self {
        Self {
            id: Some(id),
            ..Self::success()
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Self::success()
        }
    }

    pub fn with_code(mut self, code: Option<&str>) -> Self {
        self.code = code.map(str::to_string);
        self
    }

    pub fn with_matching_ids(mut self, ids: &[ItemId]) -> Self {
        self.matching_ids = ids.to_vec();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
