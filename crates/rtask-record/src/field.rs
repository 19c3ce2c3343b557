//! Field names for task records
//!
//! Provides [`FieldName`], the validated snake_case identifier of a record
//! field, and its kebab-case wire form.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Name of the discriminator field
pub const DISCRIMINATOR: &str = "type";

/// Identifier of a field within a task record
///
/// Always lowercase ASCII alphanumerics separated by single underscores.
/// The wire protocol uses the kebab-case form of the same identifier.
///
/// # Examples
/// - `backup_directory` → wire name `backup-directory`
/// - `email_on_start` → wire name `email-on-start`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    /// Create a validated field name
    ///
    /// # Errors
    /// Returns error if the name is empty or not snake_case
    pub fn new(name: impl Into<String>) -> Result<Self, FieldNameError> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    /// Create a field name from a compile-time literal
    ///
    /// # Panics
    /// Panics if the literal is not a valid snake_case identifier. Only
    /// use with literals whose validity is covered by tests.
    #[must_use]
    pub fn from_static(name: &'static str) -> Self {
        match validate(name) {
            Ok(()) => Self(name.to_string()),
            Err(e) => panic!("invalid static field name '{name}': {e}"),
        }
    }

    /// Parse a kebab-case wire name
    ///
    /// # Errors
    /// Returns error if the converted name is not a valid identifier
    pub fn from_wire(wire: &str) -> Result<Self, FieldNameError> {
        Self::new(wire.replace('-', "_"))
    }

    /// Kebab-case name used on the wire
    #[inline]
    #[must_use]
    pub fn wire_name(&self) -> String {
        self.0.replace('_', "-")
    }

    /// The snake_case identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the discriminator field
    #[inline]
    #[must_use]
    pub fn is_discriminator(&self) -> bool {
        self.0 == DISCRIMINATOR
    }
}

fn validate(name: &str) -> Result<(), FieldNameError> {
    if name.is_empty() {
        return Err(FieldNameError::Empty);
    }
    let well_formed = name
        .split('_')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if !well_formed {
        return Err(FieldNameError::Invalid(name.to_string()));
    }
    Ok(())
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for FieldName {
    type Err = FieldNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FieldName {
    type Error = FieldNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors related to field names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldNameError {
    /// Empty name
    #[error("field name is empty")]
    Empty,

    /// Not a snake_case identifier
    #[error("invalid field name: {0} (must be lowercase snake_case)")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_valid() {
        let name = FieldName::new("backup_directory").unwrap();
        assert_eq!(name.as_str(), "backup_directory");
        assert_eq!(name.to_string(), "backup_directory");
    }

    #[test]
    fn name_with_digits() {
        assert!(FieldName::new("log_file_head_collection_size_kb").is_ok());
        assert!(FieldName::new("retain_2").is_ok());
    }

    #[test]
    fn name_rejects_empty() {
        assert_eq!(FieldName::new(""), Err(FieldNameError::Empty));
    }

    #[test]
    fn name_rejects_kebab_and_upper() {
        assert!(matches!(FieldName::new("backup-directory"), Err(FieldNameError::Invalid(_))));
        assert!(matches!(FieldName::new("BackupDirectory"), Err(FieldNameError::Invalid(_))));
    }

    #[test]
    fn name_rejects_stray_underscores() {
        assert!(FieldName::new("_leading").is_err());
        assert!(FieldName::new("trailing_").is_err());
        assert!(FieldName::new("double__gap").is_err());
    }

    #[test]
    fn wire_name_is_kebab() {
        let name = FieldName::from_static("cancel_on_task_dependency_failure");
        assert_eq!(name.wire_name(), "cancel-on-task-dependency-failure");
    }

    #[test]
    fn from_wire_reverses_wire_name() {
        let name = FieldName::from_wire("ldap-url-for-search-expected-to-return-entries").unwrap();
        assert_eq!(name.as_str(), "ldap_url_for_search_expected_to_return_entries");
    }

    #[test]
    fn discriminator_detected() {
        assert!(FieldName::from_static("type").is_discriminator());
        assert!(!FieldName::from_static("description").is_discriminator());
    }

    #[test]
    #[should_panic(expected = "invalid static field name")]
    fn from_static_panics_on_invalid() {
        let _ = FieldName::from_static("Not-Valid");
    }

    #[test]
    fn serde_round_trip_validates() {
        let name: FieldName = serde_json::from_str("\"email_on_start\"").unwrap();
        assert_eq!(name.as_str(), "email_on_start");
        assert!(serde_json::from_str::<FieldName>("\"email-on-start\"").is_err());
    }
}
