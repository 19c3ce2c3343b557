//! Field applicability validation
//!
//! Checks a record against the rules of its variant. Every problem is
//! reported; validation never stops at the first error.

use crate::variant::Variant;
use rtask_record::{FieldKind, FieldName, TaskRecord};
use serde::Serialize;

/// Validator for variant field rules
///
/// Stateless: a pure function of the record and the variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldApplicabilityValidator;

/// Knobs for a validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report required fields that are absent
    pub check_required: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { check_required: true }
    }
}

impl ValidationOptions {
    /// Options for reconciling into an existing object, where required
    /// values are already held by the server
    #[inline]
    #[must_use]
    pub fn adopt() -> Self {
        Self { check_required: false }
    }
}

impl FieldApplicabilityValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a record against its variant
    ///
    /// # Returns
    /// All violations, in a stable order: per-field problems in field name
    /// order, then missing required fields in declaration order, then
    /// constraint violations in declaration order. Empty when valid.
    #[must_use]
    pub fn validate(&self, record: &TaskRecord, variant: &Variant) -> Vec<ValidationError> {
        self.validate_with(record, variant, ValidationOptions::default())
    }

    /// Validate with explicit options
    #[must_use]
    pub fn validate_with(
        &self,
        record: &TaskRecord,
        variant: &Variant,
        options: ValidationOptions,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in record.fields() {
            match variant.kind_of(field.as_str()) {
                None => push_unique(
                    &mut errors,
                    ValidationError::FieldNotApplicable {
                        field: field.clone(),
                        variant: variant.name().to_string(),
                    },
                ),
                Some(expected) if expected != value.kind() => push_unique(
                    &mut errors,
                    ValidationError::WrongValueKind {
                        field: field.clone(),
                        expected,
                        found: value.kind(),
                    },
                ),
                Some(_) => {}
            }
        }

        if options.check_required {
            for field in variant.required_fields() {
                if !record.has_value(field.as_str()) {
                    push_unique(
                        &mut errors,
                        ValidationError::MissingRequiredField {
                            field: field.clone(),
                            variant: variant.name().to_string(),
                        },
                    );
                }
            }
        }

        for constraint in variant.cross_field_constraints() {
            if let Some(violation) = constraint.check(record) {
                if !options.check_required && violation.is_presence() {
                    continue;
                }
                push_unique(&mut errors, violation);
            }
        }

        errors
    }
}

fn push_unique(errors: &mut Vec<ValidationError>, error: ValidationError) {
    if !errors.contains(&error) {
        errors.push(error);
    }
}

/// Validation-class errors
///
/// Detected before any request is sent and always fixable by correcting
/// the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Field belongs to another variant
    #[error("field '{field}' is not applicable to variant '{variant}'")]
    FieldNotApplicable { field: FieldName, variant: String },

    /// Required field is absent
    #[error("field '{field}' is required for variant '{variant}'")]
    MissingRequiredField { field: FieldName, variant: String },

    /// Mutually exclusive fields are both set
    #[error("fields '{first}' and '{second}' cannot both be set")]
    ConflictingFields { first: FieldName, second: FieldName },

    /// None of a group of fields is set
    #[error("at least one of [{}] must be set", join(.fields))]
    MissingOneOf { fields: Vec<FieldName> },

    /// Value kind differs from the declared kind
    #[error("field '{field}' expects a {expected} value, got {found}")]
    WrongValueKind {
        field: FieldName,
        expected: FieldKind,
        found: FieldKind,
    },
}

impl ValidationError {
    /// Check if the error is about a value being absent
    #[inline]
    #[must_use]
    pub fn is_presence(&self) -> bool {
        matches!(self, Self::MissingRequiredField { .. } | Self::MissingOneOf { .. })
    }
}

fn join(fields: &[FieldName]) -> String {
    fields.iter().map(FieldName::as_str).collect::<Vec<_>>().join(", ")
}
