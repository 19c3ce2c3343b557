//! Persisted resource state

use chrono::{DateTime, Utc};
use rtask_record::TaskRecord;
use rtask_variant::{decode_record, KeyStyle, VariantRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;

/// What the provider remembers about one recurring task between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    /// Server object id
    pub id: String,
    /// Normalized server record; `None` for a fresh import
    pub record: Option<TaskRecord>,
    /// Time of the last create, update or successful no-op update
    pub last_updated: DateTime<Utc>,
    /// Server notifications from the last response
    pub notifications: BTreeSet<String>,
    /// Server required actions from the last response
    pub required_actions: BTreeSet<String>,
    /// Object existed before this provider took it over
    pub adopted: bool,
}

impl ResourceState {
    /// State for a record just read from the server
    #[must_use]
    pub fn new(id: impl Into<String>, record: TaskRecord) -> Self {
        Self {
            id: id.into(),
            record: Some(record),
            last_updated: Utc::now(),
            notifications: BTreeSet::new(),
            required_actions: BTreeSet::new(),
            adopted: false,
        }
    }

    /// Placeholder for an import; the next read fills the record
    #[must_use]
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record: None,
            last_updated: Utc::now(),
            notifications: BTreeSet::new(),
            required_actions: BTreeSet::new(),
            adopted: false,
        }
    }

    /// With server messages
    #[must_use]
    pub fn with_messages(mut self, notifications: BTreeSet<String>, required_actions: BTreeSet<String>) -> Self {
        self.notifications = notifications;
        self.required_actions = required_actions;
        self
    }

    /// Mark as adopted (or not)
    #[must_use]
    pub fn with_adopted(mut self, adopted: bool) -> Self {
        self.adopted = adopted;
        self
    }

    /// Refresh `last_updated`
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Task type of the stored record
    #[must_use]
    pub fn task_type(&self) -> Option<&str> {
        self.record.as_ref().map(TaskRecord::task_type)
    }

    /// Serialize for storage
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Load stored state, decoding the record through the registry
    ///
    /// # Errors
    /// Returns error if the JSON does not have the stored shape or the
    /// record does not decode
    pub fn from_json(value: JsonValue, registry: &VariantRegistry) -> Result<Self, StateError> {
        let stored: StoredState = serde_json::from_value(value)?;
        let record = stored
            .record
            .map(|object| decode_record(&object, registry, KeyStyle::Snake))
            .transpose()?;
        Ok(Self {
            id: stored.id,
            record,
            last_updated: stored.last_updated,
            notifications: stored.notifications,
            required_actions: stored.required_actions,
            adopted: stored.adopted,
        })
    }
}

/// On-disk shape; the record stays raw until the registry decodes it
#[derive(Deserialize)]
struct StoredState {
    id: String,
    record: Option<Map<String, JsonValue>>,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    notifications: BTreeSet<String>,
    #[serde(default)]
    required_actions: BTreeSet<String>,
    #[serde(default)]
    adopted: bool,
}

/// Errors loading stored state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// JSON shape is wrong
    #[error("malformed state: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored record does not decode
    #[error("malformed stored record: {0}")]
    Record(#[from] rtask_variant::DecodeError),
}
