//! Variant descriptors
//!
//! A [`Variant`] is the immutable rule set of one task kind: which fields it
//! owns, which of them are required, their kinds, their defaults and the
//! cross-field constraints that apply.

use crate::constraint::Constraint;
use crate::registry::RegistryError;
use indexmap::IndexMap;
use rtask_record::{FieldKind, FieldName, FieldValue};
use std::collections::BTreeMap;

/// Prefix of the schema URN identifying a variant on the wire
pub const SCHEMA_PREFIX: &str = "urn:pingidentity:schemas:configuration:2.0:recurring-task:";

/// Fields every variant carries, in declaration order, with their defaults
const SHARED_FIELDS: [(&str, FieldKind); 8] = [
    ("description", FieldKind::String),
    ("cancel_on_task_dependency_failure", FieldKind::Bool),
    ("email_on_start", FieldKind::Set),
    ("email_on_success", FieldKind::Set),
    ("email_on_failure", FieldKind::Set),
    ("alert_on_start", FieldKind::Bool),
    ("alert_on_success", FieldKind::Bool),
    ("alert_on_failure", FieldKind::Bool),
];

fn shared_default(field: &str) -> Option<FieldValue> {
    match field {
        "cancel_on_task_dependency_failure" | "alert_on_start" | "alert_on_success" => Some(FieldValue::Bool(false)),
        "alert_on_failure" => Some(FieldValue::Bool(true)),
        _ => None,
    }
}

/// How a variant relates to one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Shared by all variants
    Shared,
    /// Owned and required
    Required,
    /// Owned and optional
    Optional,
}

/// Declaration of one field within a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Value kind
    pub kind: FieldKind,
    /// Relation to the variant
    pub presence: Presence,
}

/// Immutable descriptor of one task variant
///
/// # Invariants
/// - Shared fields come first in declaration order, then owned fields
/// - Every default names an optional or shared field and matches its kind
/// - Every field a constraint mentions is declared (except the field of a
///   `FieldOnlyValidForVariant` rule, which is about foreign fields)
#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    schema_urn: String,
    fields: IndexMap<FieldName, FieldSpec>,
    defaults: BTreeMap<FieldName, FieldValue>,
    constraints: Vec<Constraint>,
}

impl Variant {
    /// Start building a variant
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>) -> VariantBuilder {
        VariantBuilder::new(name)
    }

    /// Discriminator value
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema URN used on the wire
    #[inline]
    #[must_use]
    pub fn schema_urn(&self) -> &str {
        &self.schema_urn
    }

    /// Required fields in declaration order
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldName> {
        self.with_presence(Presence::Required)
    }

    fn with_presence(&self, presence: Presence) -> impl Iterator<Item = &FieldName> {
        self.fields
            .iter()
            .filter(move |(_, spec)| spec.presence == presence)
            .map(|(name, _)| name)
    }

    /// Every declared field in declaration order
    pub fn declared_fields(&self) -> impl Iterator<Item = (&FieldName, &FieldSpec)> {
        self.fields.iter()
    }

    /// Declaration of a field, if the variant declares it
    #[inline]
    #[must_use]
    pub fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    /// Kind of a declared field
    #[inline]
    #[must_use]
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.spec(field).map(|s| s.kind)
    }

    /// Check if the field is required
    #[inline]
    #[must_use]
    pub fn is_required(&self, field: &str) -> bool {
        self.spec(field).is_some_and(|s| s.presence == Presence::Required)
    }

    /// Declaration index of a field, used for stable ordering
    #[inline]
    #[must_use]
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.get_index_of(field)
    }

    /// Default values keyed by field
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &BTreeMap<FieldName, FieldValue> {
        &self.defaults
    }

    /// Default for one field
    #[inline]
    #[must_use]
    pub fn default_for(&self, field: &str) -> Option<&FieldValue> {
        self.defaults.get(field)
    }

    /// Cross-field constraints
    #[inline]
    #[must_use]
    pub fn cross_field_constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Builder for [`Variant`]
///
/// Invalid declarations are remembered and reported by [`VariantBuilder::build`].
#[derive(Debug)]
pub struct VariantBuilder {
    name: String,
    fields: IndexMap<FieldName, FieldSpec>,
    defaults: BTreeMap<FieldName, FieldValue>,
    constraints: Vec<Constraint>,
    error: Option<RegistryError>,
}

impl VariantBuilder {
    /// Create new builder
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            defaults: BTreeMap::new(),
            constraints: Vec::new(),
            error: None,
        }
    }

    /// Declare a required field
    #[must_use]
    pub fn required(self, field: &str, kind: FieldKind) -> Self {
        self.declare(field, kind, Presence::Required)
    }

    /// Declare an optional field without a default
    #[must_use]
    pub fn optional(self, field: &str, kind: FieldKind) -> Self {
        self.declare(field, kind, Presence::Optional)
    }

    /// Declare an optional field with a default
    #[must_use]
    pub fn optional_default(self, field: &str, default: impl Into<FieldValue>) -> Self {
        let default = default.into();
        self.declare(field, default.kind(), Presence::Optional)
            .default_value(field, default)
    }

    /// Set the default of an already declared field
    #[must_use]
    pub fn default_value(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        match FieldName::new(field) {
            Ok(name) => {
                self.defaults.insert(name, value.into());
            }
            Err(e) => self.fail(RegistryError::InvalidField {
                variant: self.name.clone(),
                reason: e.to_string(),
            }),
        }
        self
    }

    /// Add a cross-field constraint
    #[inline]
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn declare(mut self, field: &str, kind: FieldKind, presence: Presence) -> Self {
        let name = match FieldName::new(field) {
            Ok(name) => name,
            Err(e) => {
                self.fail(RegistryError::InvalidField {
                    variant: self.name.clone(),
                    reason: e.to_string(),
                });
                return self;
            }
        };
        if name.is_discriminator() || self.fields.contains_key(name.as_str()) {
            self.fail(RegistryError::DuplicateField {
                variant: self.name.clone(),
                field: name.to_string(),
            });
            return self;
        }
        self.fields.insert(name, FieldSpec { kind, presence });
        self
    }

    fn fail(&mut self, error: RegistryError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Build the variant
    ///
    /// # Errors
    /// Returns the first invalid declaration, or an inconsistency between
    /// defaults, constraints and declared fields
    pub fn build(self) -> Result<Variant, RegistryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut fields = IndexMap::new();
        let mut defaults = BTreeMap::new();
        for (field, kind) in SHARED_FIELDS {
            let name = FieldName::from_static(field);
            if self.fields.contains_key(field) {
                return Err(RegistryError::DuplicateField {
                    variant: self.name,
                    field: field.to_string(),
                });
            }
            if let Some(default) = shared_default(field) {
                defaults.insert(name.clone(), default);
            }
            fields.insert(
                name,
                FieldSpec {
                    kind,
                    presence: Presence::Shared,
                },
            );
        }
        fields.extend(self.fields);

        for (field, value) in self.defaults {
            let Some(spec) = fields.get(field.as_str()) else {
                return Err(RegistryError::UndeclaredField {
                    variant: self.name,
                    field: field.to_string(),
                });
            };
            if spec.presence == Presence::Required {
                return Err(RegistryError::DefaultOnRequired {
                    variant: self.name,
                    field: field.to_string(),
                });
            }
            if spec.kind != value.kind() {
                return Err(RegistryError::DefaultKindMismatch {
                    variant: self.name,
                    field: field.to_string(),
                    expected: spec.kind,
                    found: value.kind(),
                });
            }
            defaults.insert(field, value);
        }

        for constraint in &self.constraints {
            if matches!(constraint, Constraint::FieldOnlyValidForVariant(..)) {
                continue;
            }
            if let Some(missing) = constraint.fields().into_iter().find(|f| !fields.contains_key(f.as_str())) {
                return Err(RegistryError::UndeclaredField {
                    variant: self.name,
                    field: missing.to_string(),
                });
            }
        }

        let schema_urn = format!("{SCHEMA_PREFIX}{}", self.name);

        Ok(Variant {
            name: self.name,
            schema_urn,
            fields,
            defaults,
            constraints: self.constraints,
        })
    }
}
