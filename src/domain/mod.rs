//! Domain models for taskbridge
//!
//! Contains the core business logic without any I/O concerns.

mod error;
mod id;
mod item;
mod resolve;

pub use error::ErrorKind;
pub use id::{IdError, ItemId, TempId};
pub use item::{keys, parse_date, Containment, Item, ItemChanges, ItemError, ItemType, Properties};
pub use resolve::{
    resolve, resolve_item, Candidate, IdentifierQuery, ResolveError, DISAMBIGUATION_REQUIRED,
};
