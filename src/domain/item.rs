//! Item domain model
//!
//! Items are the tasks and projects that live inside the external
//! application. Creation requests carry an opaque property bag; only the
//! application side (a backend) interprets the well-known keys.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::id::ItemId;

/// Well-known property keys understood by backends
pub mod keys {
    pub const NOTE: &str = "note";
    pub const FLAGGED: &str = "flagged";
    pub const DUE_DATE: &str = "dueDate";
    pub const DEFER_DATE: &str = "deferDate";
    pub const TAGS: &str = "tags";
    pub const ESTIMATED_MINUTES: &str = "estimatedMinutes";
    pub const PROJECT_ID: &str = "projectId";
    pub const PARENT_TASK_ID: &str = "parentTaskId";
    pub const FOLDER_NAME: &str = "folderName";
}

#[derive(Debug, Error, PartialEq)]
pub enum ItemError {
    #[error("Invalid {field} '{value}': expected RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid property '{key}': expected {expected}")]
    InvalidProperty { key: String, expected: &'static str },

    #[error("projectId and parentTaskId cannot both be set")]
    ConflictingContainment,
}

/// Kind of item that can be created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Task,
    Project,
}

impl ItemType {
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Task => "task",
            ItemType::Project => "project",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque bag of item fields forwarded verbatim to the application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over all key-value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn take_str(&mut self, key: &str) -> Result<Option<String>, ItemError> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ItemError::InvalidProperty {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }

    fn take_bool(&mut self, key: &str) -> Result<Option<bool>, ItemError> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(ItemError::InvalidProperty {
                key: key.to_string(),
                expected: "a boolean",
            }),
        }
    }

    fn take_minutes(&mut self, key: &str) -> Result<Option<u32>, ItemError> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| ItemError::InvalidProperty {
                    key: key.to_string(),
                    expected: "a non-negative integer",
                }),
            Some(_) => Err(ItemError::InvalidProperty {
                key: key.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }

    fn take_tags(&mut self, key: &str) -> Result<Vec<String>, ItemError> {
        let invalid = || ItemError::InvalidProperty {
            key: key.to_string(),
            expected: "an array of strings",
        };
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    _ => Err(invalid()),
                })
                .collect(),
            Some(_) => Err(invalid()),
        }
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Where an item lives inside the application
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Containment {
    /// Top level (tasks in the inbox, projects at the library root)
    #[default]
    Inbox,
    /// Directly inside a project
    Project(ItemId),
    /// Subtask of another task
    Task(ItemId),
}

impl Containment {
    /// Property key a child uses to point at a parent of the given type
    pub fn key_for(parent_type: ItemType) -> &'static str {
        match parent_type {
            ItemType::Project => keys::PROJECT_ID,
            ItemType::Task => keys::PARENT_TASK_ID,
        }
    }

    pub fn is_inbox(&self) -> bool {
        matches!(self, Containment::Inbox)
    }

    /// Returns the containing item's ID, if any
    pub fn parent_id(&self) -> Option<&ItemId> {
        match self {
            Containment::Inbox => None,
            Containment::Project(id) | Containment::Task(id) => Some(id),
        }
    }

    /// Extracts the containment target from a property bag
    fn take_from(props: &mut Properties) -> Result<Self, ItemError> {
        let project = props.take_str(keys::PROJECT_ID)?;
        let parent_task = props.take_str(keys::PARENT_TASK_ID)?;

        let parse = |key: &str, raw: String| {
            raw.parse::<ItemId>().map_err(|_| ItemError::InvalidProperty {
                key: key.to_string(),
                expected: "a non-empty item ID",
            })
        };

        match (project, parent_task) {
            (Some(_), Some(_)) => Err(ItemError::ConflictingContainment),
            (Some(raw), None) => Ok(Containment::Project(parse(keys::PROJECT_ID, raw)?)),
            (None, Some(raw)) => Ok(Containment::Task(parse(keys::PARENT_TASK_ID, raw)?)),
            (None, None) => Ok(Containment::Inbox),
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::Inbox => f.write_str("inbox"),
            Containment::Project(id) => write!(f, "project {}", id),
            Containment::Task(id) => write!(f, "task {}", id),
        }
    }
}

/// Parses a date given either as an RFC 3339 timestamp or a plain calendar date
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, ItemError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ItemError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn is_false(val: &bool) -> bool {
    !*val
}

/// A task or project stored in the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Real identifier
    pub id: ItemId,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub name: String,

    #[serde(default, skip_serializing_if = "Containment::is_inbox")]
    pub containment: Containment,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub flagged: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,

    /// Folder a project is filed under (projects only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,

    /// Properties without a dedicated field, kept verbatim
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub extra: Properties,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates a bare item at the top level
    pub fn new(id: ItemId, item_type: ItemType, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            item_type,
            name: name.into(),
            containment: Containment::Inbox,
            note: None,
            flagged: false,
            tags: Vec::new(),
            due_date: None,
            defer_date: None,
            estimated_minutes: None,
            folder_name: None,
            extra: Properties::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds an item from a creation property bag
    pub fn from_properties(
        id: ItemId,
        item_type: ItemType,
        name: impl Into<String>,
        properties: &Properties,
    ) -> Result<Self, ItemError> {
        let mut props = properties.clone();
        let mut item = Self::new(id, item_type, name);

        item.containment = Containment::take_from(&mut props)?;
        item.note = props.take_str(keys::NOTE)?;
        item.flagged = props.take_bool(keys::FLAGGED)?.unwrap_or(false);
        item.tags = props.take_tags(keys::TAGS)?;
        item.due_date = props
            .take_str(keys::DUE_DATE)?
            .map(|v| parse_date(keys::DUE_DATE, &v))
            .transpose()?;
        item.defer_date = props
            .take_str(keys::DEFER_DATE)?
            .map(|v| parse_date(keys::DEFER_DATE, &v))
            .transpose()?;
        item.estimated_minutes = props.take_minutes(keys::ESTIMATED_MINUTES)?;
        item.folder_name = props.take_str(keys::FOLDER_NAME)?;
        item.extra = props;

        Ok(item)
    }

    /// Applies an edit, bumping `updated_at` when anything changed
    pub fn apply(&mut self, changes: &ItemChanges) -> Result<bool, ItemError> {
        let before = self.clone();

        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(note) = &changes.note {
            self.note = if note.is_empty() { None } else { Some(note.clone()) };
        }
        if let Some(flagged) = changes.flagged {
            self.flagged = flagged;
        }
        if let Some(due) = &changes.due_date {
            self.due_date = if due.is_empty() {
                None
            } else {
                Some(parse_date(keys::DUE_DATE, due)?)
            };
        }
        if let Some(defer) = &changes.defer_date {
            self.defer_date = if defer.is_empty() {
                None
            } else {
                Some(parse_date(keys::DEFER_DATE, defer)?)
            };
        }
        if let Some(minutes) = changes.estimated_minutes {
            self.estimated_minutes = Some(minutes);
        }
        for tag in &changes.add_tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
        self.tags.retain(|t| !changes.remove_tags.contains(t));

        let changed = *self != before;
        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }
}

/// Field edits for a single item
///
/// An empty string clears `note`, `due_date` and `defer_date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_tags: Vec<String>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        serde_json::from_value(value).unwrap()
    }

    fn task_id() -> ItemId {
        ItemId::mint(ItemType::Task, "Test", Utc::now())
    }

    #[test]
    fn from_properties_extracts_known_keys() {
        let p = props(json!({
            "note": "remember milk",
            "flagged": true,
            "tags": ["errands", "home"],
            "dueDate": "2026-03-01",
            "estimatedMinutes": 15,
            "color": "blue",
        }));

        let item = Item::from_properties(task_id(), ItemType::Task, "Shop", &p).unwrap();

        assert_eq!(item.note.as_deref(), Some("remember milk"));
        assert!(item.flagged);
        assert_eq!(item.tags, vec!["errands", "home"]);
        assert_eq!(item.due_date.unwrap().to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(item.estimated_minutes, Some(15));
        assert_eq!(item.extra.get("color"), Some(&json!("blue")));
        assert!(item.containment.is_inbox());
    }

    #[test]
    fn containment_from_properties() {
        let p = props(json!({ "projectId": "p-1234567" }));
        let item = Item::from_properties(task_id(), ItemType::Task, "In project", &p).unwrap();
        assert_eq!(item.containment, Containment::Project("p-1234567".parse().unwrap()));

        let p = props(json!({ "parentTaskId": "t-7654321" }));
        let item = Item::from_properties(task_id(), ItemType::Task, "Subtask", &p).unwrap();
        assert_eq!(item.containment, Containment::Task("t-7654321".parse().unwrap()));
    }

    #[test]
    fn conflicting_containment_rejected() {
        let p = props(json!({ "projectId": "p-1", "parentTaskId": "t-1" }));
        let err = Item::from_properties(task_id(), ItemType::Task, "X", &p).unwrap_err();
        assert_eq!(err, ItemError::ConflictingContainment);
    }

    #[test]
    fn invalid_values_rejected() {
        let p = props(json!({ "dueDate": "next tuesday" }));
        assert!(matches!(
            Item::from_properties(task_id(), ItemType::Task, "X", &p),
            Err(ItemError::InvalidDate { field: "dueDate", .. })
        ));

        let p = props(json!({ "flagged": "yes" }));
        assert!(matches!(
            Item::from_properties(task_id(), ItemType::Task, "X", &p),
            Err(ItemError::InvalidProperty { .. })
        ));

        let p = props(json!({ "tags": ["ok", 3] }));
        assert!(Item::from_properties(task_id(), ItemType::Task, "X", &p).is_err());
    }

    #[test]
    fn rfc3339_dates_are_normalized_to_utc() {
        let ts = parse_date("dueDate", "2026-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T08:00:00+00:00");
    }

    #[test]
    fn key_for_parent_type() {
        assert_eq!(Containment::key_for(ItemType::Project), "projectId");
        assert_eq!(Containment::key_for(ItemType::Task), "parentTaskId");
    }

    #[test]
    fn apply_changes() {
        let mut item = Item::new(task_id(), ItemType::Task, "Old");
        item.tags = vec!["a".to_string(), "b".to_string()];

        let changes = ItemChanges {
            name: Some("New".to_string()),
            flagged: Some(true),
            add_tags: vec!["c".to_string(), "a".to_string()],
            remove_tags: vec!["b".to_string()],
            ..Default::default()
        };

        assert!(item.apply(&changes).unwrap());
        assert_eq!(item.name, "New");
        assert!(item.flagged);
        assert_eq!(item.tags, vec!["a", "c"]);
    }

    #[test]
    fn apply_empty_string_clears() {
        let mut item = Item::new(task_id(), ItemType::Task, "X");
        item.note = Some("old".to_string());
        item.due_date = Some(Utc::now());

        let changes = ItemChanges {
            note: Some(String::new()),
            due_date: Some(String::new()),
            ..Default::default()
        };
        item.apply(&changes).unwrap();

        assert!(item.note.is_none());
        assert!(item.due_date.is_none());
    }

    #[test]
    fn apply_noop_reports_unchanged() {
        let mut item = Item::new(task_id(), ItemType::Task, "Same");
        let changes = ItemChanges {
            name: Some("Same".to_string()),
            ..Default::default()
        };
        assert!(!item.apply(&changes).unwrap());
    }

    #[test]
    fn item_serde_roundtrip_keeps_containment() {
        let mut item = Item::new(task_id(), ItemType::Task, "Child");
        item.containment = Containment::Task("t-1234567".parse().unwrap());

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"task\""));
        let parsed: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }
}
