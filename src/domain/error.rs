//! Caller-facing error taxonomy
//!
//! Shared by the batch engine and every single-item operation so that a
//! failure is described with the same vocabulary wherever it surfaces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of failure reported for one position or one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input; nothing was sent to the application
    #[serde(rename = "validation_error")]
    Validation,

    /// `parentTempId` matches no `tempId` declared in the batch
    #[serde(rename = "unknown_reference")]
    UnknownReference,

    /// Item sits on, or below, a cycle of parent references
    #[serde(rename = "cycle_error")]
    Cycle,

    /// An ancestor failed, so the item was never sent
    #[serde(rename = "dependency_failed")]
    DependencyFailed,

    /// The application rejected the creation or the call failed
    #[serde(rename = "creation_error")]
    Creation,

    #[serde(rename = "not_found")]
    NotFound,

    #[serde(rename = "disambiguation")]
    Disambiguation,

    /// The application refused an edit, move or removal
    #[serde(rename = "application_error")]
    Application,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::UnknownReference => "unknown_reference",
            ErrorKind::Cycle => "cycle_error",
            ErrorKind::DependencyFailed => "dependency_failed",
            ErrorKind::Creation => "creation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Disambiguation => "disambiguation",
            ErrorKind::Application => "application_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
