//! Identifiers for items and batch-scoped references
//!
//! ID Format (local store):
//! - Task IDs: `t-{7-char-hash}` (e.g., `t-9d3e5f2`)
//! - Project IDs: `p-{7-char-hash}` (e.g., `p-7f2b4c1`)
//!
//! IDs minted by an external bridge are opaque and only required to be
//! non-empty. Temp IDs are caller-chosen strings that live for one batch call.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item::ItemType;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Item ID must not be empty")]
    EmptyItemId,

    #[error("Temp ID must not be empty")]
    EmptyTempId,
}

/// Disambiguates IDs minted within the same nanosecond
static MINT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a 7-character hash from name, timestamp and a process-local counter
fn generate_hash(name: &str, timestamp: DateTime<Utc>) -> String {
    let seq = MINT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}",
        name,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        seq
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Real identifier assigned by the application once an item exists
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Mints a new local ID for an item of the given type
    pub fn mint(item_type: ItemType, name: &str, timestamp: DateTime<Utc>) -> Self {
        let prefix = match item_type {
            ItemType::Task => "t",
            ItemType::Project => "p",
        };
        Self(format!("{}-{}", prefix, generate_hash(name, timestamp)))
    }

    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::EmptyItemId);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ItemId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Caller-chosen reference that only has meaning inside one batch call
///
/// Matching is exact: no trimming or case folding is applied beyond
/// rejecting blank values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TempId(String);

impl TempId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TempId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(IdError::EmptyTempId);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TempId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TempId> for String {
    fn from(id: TempId) -> Self {
        id.0
    }
}
