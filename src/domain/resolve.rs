//! Identifier resolution
//!
//! Resolves a caller-supplied `{id?, name?}` pair to exactly one entity from a
//! candidate snapshot. Precedence:
//!
//! 1. `id` present: exact ID match or not-found. `name` is never consulted.
//! 2. `name` present: case-sensitive exact match. Zero matches is not-found,
//!    more than one is ambiguous and carries every matching ID.
//! 3. Neither present: validation error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::ErrorKind;
use super::id::ItemId;
use super::item::{Item, ItemType};

/// Error code surfaced to callers for ambiguous name matches
pub const DISAMBIGUATION_REQUIRED: &str = "DISAMBIGUATION_REQUIRED";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("Either id or name must be provided to identify the {0}")]
    MissingIdentifier(ItemType),

    #[error("No {item_type} found with id '{id}'")]
    NotFoundById { item_type: ItemType, id: String },

    #[error("No {item_type} found with name '{name}'")]
    NotFoundByName { item_type: ItemType, name: String },

    #[error("Multiple {item_type}s ({count}) match the name '{name}'. Please specify an id instead.", count = .matching_ids.len())]
    Ambiguous {
        item_type: ItemType,
        name: String,
        matching_ids: Vec<ItemId>,
    },
}

impl ResolveError {
    /// Machine-readable error code, only set for disambiguation failures
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ResolveError::Ambiguous { .. } => Some(DISAMBIGUATION_REQUIRED),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::MissingIdentifier(_) => ErrorKind::Validation,
            ResolveError::NotFoundById { .. } | ResolveError::NotFoundByName { .. } => {
                ErrorKind::NotFound
            }
            ResolveError::Ambiguous { .. } => ErrorKind::Disambiguation,
        }
    }

    /// IDs the caller can retry with
    pub fn matching_ids(&self) -> &[ItemId] {
        match self {
            ResolveError::Ambiguous { matching_ids, .. } => matching_ids,
            _ => &[],
        }
    }
}

/// Caller-supplied identification of a single entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IdentifierQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Returns true when neither field carries a usable value
    pub fn is_empty(&self) -> bool {
        non_blank(&self.id).is_none() && non_blank(&self.name).is_none()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Minimal view of an entity used for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: ItemId,
    pub name: String,
}

impl From<&Item> for Candidate {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
        }
    }
}

/// Resolves a query against a candidate snapshot of one item type
pub fn resolve<'a>(
    item_type: ItemType,
    query: &IdentifierQuery,
    candidates: impl IntoIterator<Item = &'a Candidate>,
) -> Result<Candidate, ResolveError> {
    if let Some(id) = non_blank(&query.id) {
        let id = id.trim();
        return candidates
            .into_iter()
            .find(|c| c.id.as_str() == id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFoundById {
                item_type,
                id: id.to_string(),
            });
    }

    let name = non_blank(&query.name).ok_or(ResolveError::MissingIdentifier(item_type))?;

    let mut matches: Vec<&Candidate> = candidates.into_iter().filter(|c| c.name == name).collect();

    match matches.len() {
        0 => Err(ResolveError::NotFoundByName {
            item_type,
            name: name.to_string(),
        }),
        1 => Ok(matches.remove(0).clone()),
        _ => Err(ResolveError::Ambiguous {
            item_type,
            name: name.to_string(),
            matching_ids: matches.into_iter().map(|c| c.id.clone()).collect(),
        }),
    }
}

/// Resolves a query directly against stored items
pub fn resolve_item<'a>(
    item_type: ItemType,
    query: &IdentifierQuery,
    items: &'a [Item],
) -> Result<&'a Item, ResolveError> {
    let candidates: Vec<Candidate> = items.iter().map(Candidate::from).collect();
    let resolved = resolve(item_type, query, &candidates)?;
    items
        .iter()
        .find(|item| item.id == resolved.id)
        .ok_or(ResolveError::NotFoundById {
            item_type,
            id: resolved.id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str) -> Candidate {
        Candidate {
            id: id.parse().unwrap(),
            name: name.to_string(),
        }
    }

    fn snapshot() -> Vec<Candidate> {
        vec![
            candidate("t-1", "Write report"),
            candidate("t-2", "Review"),
            candidate("t-3", "Review"),
            candidate("t-4", "review"),
        ]
    }

    #[test]
    fn resolves_by_id() {
        let found = resolve(ItemType::Task, &IdentifierQuery::by_id("t-2"), &snapshot()).unwrap();
        assert_eq!(found.id.as_str(), "t-2");
    }

    #[test]
    fn resolves_unique_name() {
        let found = resolve(
            ItemType::Task,
            &IdentifierQuery::by_name("Write report"),
            &snapshot(),
        )
        .unwrap();
        assert_eq!(found.id.as_str(), "t-1");
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let found = resolve(ItemType::Task, &IdentifierQuery::by_name("review"), &snapshot()).unwrap();
        assert_eq!(found.id.as_str(), "t-4");

        let err = resolve(ItemType::Task, &IdentifierQuery::by_name("REVIEW"), &snapshot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn duplicate_names_require_disambiguation() {
        let err = resolve(ItemType::Task, &IdentifierQuery::by_name("Review"), &snapshot()).unwrap_err();

        assert_eq!(err.code(), Some(DISAMBIGUATION_REQUIRED));
        assert_eq!(err.kind(), ErrorKind::Disambiguation);
        let ids: Vec<_> = err.matching_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["t-2", "t-3"]);
        assert!(err.to_string().contains("Multiple tasks (2)"));
    }

    #[test]
    fn id_shadows_name_even_when_missing() {
        let query = IdentifierQuery {
            id: Some("t-999".to_string()),
            name: Some("Write report".to_string()),
        };
        let err = resolve(ItemType::Task, &query, &snapshot()).unwrap_err();
        assert!(matches!(err, ResolveError::NotFoundById { .. }));
    }

    #[test]
    fn id_shadows_ambiguous_name() {
        let query = IdentifierQuery {
            id: Some("t-1".to_string()),
            name: Some("Review".to_string()),
        };
        let found = resolve(ItemType::Task, &query, &snapshot()).unwrap();
        assert_eq!(found.id.as_str(), "t-1");
    }

    #[test]
    fn missing_identifier_is_validation_error() {
        let err = resolve(ItemType::Project, &IdentifierQuery::default(), &snapshot()).unwrap_err();
        assert_eq!(err, ResolveError::MissingIdentifier(ItemType::Project));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.code().is_none());

        let blank = IdentifierQuery {
            id: Some("  ".to_string()),
            name: Some(String::new()),
        };
        assert!(blank.is_empty());
        assert!(matches!(
            resolve(ItemType::Task, &blank, &snapshot()),
            Err(ResolveError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn not_found_by_name_on_empty_snapshot() {
        let err = resolve(ItemType::Project, &IdentifierQuery::by_name("Launch"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "No project found with name 'Launch'");
    }

    #[test]
    fn resolve_item_returns_stored_item() {
        let a = Item::new("p-1".parse().unwrap(), ItemType::Project, "Alpha");
        let b = Item::new("p-2".parse().unwrap(), ItemType::Project, "Beta");
        let items = vec![a, b];

        let found = resolve_item(ItemType::Project, &IdentifierQuery::by_name("Beta"), &items).unwrap();
        assert_eq!(found.id.as_str(), "p-2");
    }
}
