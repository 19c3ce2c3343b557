//! Typed field values
//!
//! A record field holds one of a small set of value kinds. The kind of each
//! field is fixed by the variant that declares it; JSON decoding therefore
//! always goes through [`FieldValue::from_json`] with the declared kind.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Declared kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single string
    String,
    /// Boolean flag
    Bool,
    /// Signed integer
    Integer,
    /// Ordered collection of strings
    List,
    /// Unordered collection of strings
    Set,
}

impl FieldKind {
    /// Check if this kind is a collection
    #[inline]
    #[must_use]
    pub fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }

    /// Lowercase name used in diagnostics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::List => "list",
            Self::Set => "set",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Value held by a record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single string
    String(String),
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Ordered collection of strings
    List(Vec<String>),
    /// Unordered collection of strings
    Set(BTreeSet<String>),
}

impl FieldValue {
    /// Build a set value
    #[must_use]
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a list value
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Empty value of a collection kind
    ///
    /// Returns `None` for scalar kinds.
    #[must_use]
    pub fn empty_of(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::List => Some(Self::List(Vec::new())),
            FieldKind::Set => Some(Self::Set(BTreeSet::new())),
            FieldKind::String | FieldKind::Bool | FieldKind::Integer => None,
        }
    }

    /// Kind of this value
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Bool(_) => FieldKind::Bool,
            Self::Integer(_) => FieldKind::Integer,
            Self::List(_) => FieldKind::List,
            Self::Set(_) => FieldKind::Set,
        }
    }

    /// Check if this value is a collection
    #[inline]
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.kind().is_collection()
    }

    /// Check if this is the empty string
    #[inline]
    #[must_use]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }

    /// String content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Collection elements in their stored order
    ///
    /// Returns `None` for scalars.
    #[must_use]
    pub fn elements(&self) -> Option<Vec<&str>> {
        match self {
            Self::List(items) => Some(items.iter().map(String::as_str).collect()),
            Self::Set(items) => Some(items.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Convert to JSON
    ///
    /// Sets serialize in sorted order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Integer(i) => JsonValue::from(*i),
            Self::List(items) => items.iter().cloned().map(JsonValue::String).collect(),
            Self::Set(items) => items.iter().cloned().map(JsonValue::String).collect(),
        }
    }

    /// Decode a JSON value as the given kind
    ///
    /// A scalar JSON string is accepted for a collection kind and becomes a
    /// one-element collection, since single-valued attributes are commonly
    /// returned unwrapped.
    ///
    /// # Errors
    /// Returns error if the JSON shape does not fit the kind
    pub fn from_json(kind: FieldKind, value: &JsonValue) -> Result<Self, ValueError> {
        let mismatch = || ValueError::KindMismatch {
            expected: kind,
            found: json_type_name(value),
        };
        match kind {
            FieldKind::String => value.as_str().map(|s| Self::String(s.to_string())).ok_or_else(mismatch),
            FieldKind::Bool => value.as_bool().map(Self::Bool).ok_or_else(mismatch),
            FieldKind::Integer => value.as_i64().map(Self::Integer).ok_or_else(mismatch),
            FieldKind::List | FieldKind::Set => {
                let items = match value {
                    JsonValue::Array(items) => items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                        .collect::<Result<Vec<_>, _>>()?,
                    JsonValue::String(s) => vec![s.clone()],
                    _ => return Err(mismatch()),
                };
                Ok(if kind == FieldKind::List {
                    Self::List(items)
                } else {
                    Self::Set(items.into_iter().collect())
                })
            }
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::List(items) => write!(f, "{items:?}"),
            Self::Set(items) => write!(f, "{items:?}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<BTreeSet<String>> for FieldValue {
    fn from(value: BTreeSet<String>) -> Self {
        Self::Set(value)
    }
}

/// Errors decoding field values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// JSON value does not fit the declared kind
    #[error("expected {expected}, found {found}")]
    KindMismatch {
        expected: FieldKind,
        found: &'static str,
    },
}
