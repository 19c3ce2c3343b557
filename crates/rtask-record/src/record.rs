//! Sparse task records
//!
//! A [`TaskRecord`] is the flat field-to-value mapping for one task
//! configuration instance. The discriminator is stored apart from the
//! field map and is always present.

use crate::field::{FieldName, DISCRIMINATOR};
use crate::value::FieldValue;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Sparse record of one task configuration
///
/// # Invariants
/// - The discriminator (`type`) is always present and non-empty
/// - The field map never contains the discriminator
/// - Absent fields carry no opinion; present fields carry a typed value
///
/// Records are values: the engine never mutates a record it was handed,
/// it builds new ones with the `with_*`/`without` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    task_type: String,
    fields: BTreeMap<FieldName, FieldValue>,
}

impl TaskRecord {
    /// Create an empty record of the given variant
    ///
    /// # Errors
    /// Returns error if the discriminator is empty
    pub fn new(task_type: impl Into<String>) -> Result<Self, RecordError> {
        let task_type = task_type.into();
        if task_type.is_empty() {
            return Err(RecordError::EmptyDiscriminator);
        }
        Ok(Self {
            task_type,
            fields: BTreeMap::new(),
        })
    }

    /// Discriminator value
    #[inline]
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Value of a field, if present
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Check if a field is present
    #[inline]
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Check if a field is present with a value the server keeps
    ///
    /// A string field holding `""` counts as unset.
    #[inline]
    #[must_use]
    pub fn has_value(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|value| !value.is_empty_string())
    }

    /// Set a field, returning the previous value
    ///
    /// # Errors
    /// Returns error if `field` is the discriminator
    pub fn insert(&mut self, field: FieldName, value: FieldValue) -> Result<Option<FieldValue>, RecordError> {
        if field.is_discriminator() {
            return Err(RecordError::DiscriminatorIsNotAField);
        }
        Ok(self.fields.insert(field, value))
    }

    /// Remove a field, returning its value
    #[inline]
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Copy of this record with one field set
    ///
    /// # Errors
    /// Returns error if `field` is the discriminator
    pub fn with_field(mut self, field: FieldName, value: impl Into<FieldValue>) -> Result<Self, RecordError> {
        self.insert(field, value.into())?;
        Ok(self)
    }

    /// Copy of this record with one field set, by name
    ///
    /// # Errors
    /// Returns error if the name is invalid or is the discriminator
    pub fn with(self, field: &str, value: impl Into<FieldValue>) -> Result<Self, RecordError> {
        let name = FieldName::new(field).map_err(|e| RecordError::InvalidField(e.to_string()))?;
        self.with_field(name, value)
    }

    /// Copy of this record with one field removed
    #[must_use]
    pub fn without(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    /// Iterate over present fields in name order
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter()
    }

    /// Names of present fields in name order
    #[inline]
    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.keys()
    }

    /// Number of present fields (discriminator excluded)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field besides the discriminator is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for TaskRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(DISCRIMINATOR, &self.task_type)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// Errors related to record construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Discriminator value is empty
    #[error("record discriminator is empty")]
    EmptyDiscriminator,

    /// Discriminator cannot be set through the field map
    #[error("the discriminator is not an ordinary field")]
    DiscriminatorIsNotAField,

    /// Invalid field name
    #[error("invalid field: {0}")]
    InvalidField(String),
}
