//! Field-level patch operations
//!
//! Provides [`PatchOperation`], one minimal change needed to bring an
//! observed record in line with a desired one.

use crate::field::FieldName;
use crate::value::FieldValue;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Kind of change applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchKind {
    /// Replace the whole value
    Replace,

    /// Add elements to a collection
    AddValues,

    /// Remove elements from a collection
    RemoveValues,
}

/// One field-level change
///
/// # Invariants
/// - `AddValues`/`RemoveValues` always carry a non-empty collection value
/// - `field` is never the discriminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    field: FieldName,
    kind: PatchKind,
    value: FieldValue,
}

impl PatchOperation {
    /// Replace the value of `field`
    #[inline]
    #[must_use]
    pub fn replace(field: FieldName, value: FieldValue) -> Self {
        Self {
            field,
            kind: PatchKind::Replace,
            value,
        }
    }

    /// Add collection elements to `field`
    #[inline]
    #[must_use]
    pub fn add_values(field: FieldName, value: FieldValue) -> Self {
        Self {
            field,
            kind: PatchKind::AddValues,
            value,
        }
    }

    /// Remove collection elements from `field`
    #[inline]
    #[must_use]
    pub fn remove_values(field: FieldName, value: FieldValue) -> Self {
        Self {
            field,
            kind: PatchKind::RemoveValues,
            value,
        }
    }

    /// Target field
    #[inline]
    #[must_use]
    pub fn field(&self) -> &FieldName {
        &self.field
    }

    /// Operation kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> PatchKind {
        self.kind
    }

    /// Operation value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

impl Display for PatchOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            PatchKind::Replace => "replace",
            PatchKind::AddValues => "add",
            PatchKind::RemoveValues => "remove",
        };
        write!(f, "{verb} {} {}", self.field, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        let field = FieldName::from_static("included_backend_id");
        let value = FieldValue::set(["a"]);

        assert_eq!(PatchOperation::replace(field.clone(), value.clone()).kind(), PatchKind::Replace);
        assert_eq!(PatchOperation::add_values(field.clone(), value.clone()).kind(), PatchKind::AddValues);
        assert_eq!(PatchOperation::remove_values(field, value).kind(), PatchKind::RemoveValues);
    }

    #[test]
    fn display_is_readable() {
        let op = PatchOperation::replace(FieldName::from_static("compress"), FieldValue::from(true));
        assert_eq!(op.to_string(), "replace compress true");

        let op = PatchOperation::add_values(FieldName::from_static("backend_id"), FieldValue::set(["c"]));
        assert_eq!(op.to_string(), "add backend_id {\"c\"}");
    }
}
