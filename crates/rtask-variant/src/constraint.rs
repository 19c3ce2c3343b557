//! Cross-field constraints
//!
//! Constraints are checked against a fully resolved record, after
//! per-field applicability and requiredness.

use crate::validation::ValidationError;
use rtask_record::{FieldName, TaskRecord};
use serde::Serialize;

/// Rule relating several fields of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// The two fields cannot both be set
    Conflicting(FieldName, FieldName),

    /// At least one of the fields must be set
    AtLeastOneOf(Vec<FieldName>),

    /// The field must be set when the record is one of the variants
    RequiresWhenVariant(FieldName, Vec<String>),

    /// The field may only be set when the record is one of the variants
    FieldOnlyValidForVariant(FieldName, Vec<String>),
}

impl Constraint {
    /// Conflicting pair from literals
    #[must_use]
    pub fn conflicting(first: &'static str, second: &'static str) -> Self {
        Self::Conflicting(FieldName::from_static(first), FieldName::from_static(second))
    }

    /// At-least-one-of group from literals
    #[must_use]
    pub fn at_least_one_of(fields: &[&'static str]) -> Self {
        Self::AtLeastOneOf(fields.iter().copied().map(FieldName::from_static).collect())
    }

    /// Required-when-variant rule from literals
    #[must_use]
    pub fn requires_when_variant(field: &'static str, variants: &[&str]) -> Self {
        Self::RequiresWhenVariant(
            FieldName::from_static(field),
            variants.iter().map(|v| (*v).to_string()).collect(),
        )
    }

    /// Only-valid-for-variant rule from literals
    #[must_use]
    pub fn only_valid_for(field: &'static str, variants: &[&str]) -> Self {
        Self::FieldOnlyValidForVariant(
            FieldName::from_static(field),
            variants.iter().map(|v| (*v).to_string()).collect(),
        )
    }

    /// Fields this constraint mentions
    #[must_use]
    pub fn fields(&self) -> Vec<&FieldName> {
        match self {
            Self::Conflicting(a, b) => vec![a, b],
            Self::AtLeastOneOf(fields) => fields.iter().collect(),
            Self::RequiresWhenVariant(field, _) | Self::FieldOnlyValidForVariant(field, _) => vec![field],
        }
    }

    /// Check the constraint against a record
    ///
    /// Returns the violation, if any. The record's own discriminator selects
    /// the variant for the variant-conditional rules.
    #[must_use]
    pub fn check(&self, record: &TaskRecord) -> Option<ValidationError> {
        let variant = record.task_type();
        match self {
            Self::Conflicting(a, b) => (record.contains(a.as_str()) && record.contains(b.as_str())).then(|| {
                ValidationError::ConflictingFields {
                    first: a.clone(),
                    second: b.clone(),
                }
            }),
            Self::AtLeastOneOf(fields) => (!fields.iter().any(|f| record.has_value(f.as_str())))
                .then(|| ValidationError::MissingOneOf { fields: fields.clone() }),
            Self::RequiresWhenVariant(field, variants) => {
                let applies = variants.iter().any(|v| v == variant);
                (applies && !record.has_value(field.as_str())).then(|| ValidationError::MissingRequiredField {
                    field: field.clone(),
                    variant: variant.to_string(),
                })
            }
            Self::FieldOnlyValidForVariant(field, variants) => {
                let allowed = variants.iter().any(|v| v == variant);
                (!allowed && record.contains(field.as_str())).then(|| ValidationError::FieldNotApplicable {
                    field: field.clone(),
                    variant: variant.to_string(),
                })
            }
        }
    }
}
