//! taskbridge - batch hierarchical item creation for task-management applications
//!
//! Accepts ordered lists of "create an item" requests where items may name
//! other items of the same batch as their parent, creates them in dependency
//! order through a pluggable application backend, and reports one result
//! per input position. Single-item edit, remove, move and show operations
//! share one identifier resolution protocol.

pub mod backend;
pub mod batch;
pub mod cli;
pub mod domain;
pub mod ops;
pub mod storage;

pub use batch::{BatchEngine, BatchItemRequest, BatchItemResult, BatchResponse};
pub use domain::{Item, ItemId, ItemType, TempId};
