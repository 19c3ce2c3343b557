//! Variant registry
//!
//! Provides [`VariantRegistry`], the read-only catalog consulted to resolve a
//! discriminator into its [`Variant`].

use crate::catalog;
use crate::variant::Variant;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rtask_record::FieldKind;

static RECURRING_TASKS: Lazy<VariantRegistry> = Lazy::new(|| match catalog::recurring_tasks() {
    Ok(registry) => registry,
    Err(e) => panic!("recurring task catalog is malformed: {e}"),
});

/// Catalog of task variants keyed by discriminator
///
/// Populated once, then shared read-only. Registration order is kept so
/// listings are stable.
#[derive(Debug, Default, Clone)]
pub struct VariantRegistry {
    variants: IndexMap<String, Variant>,
}

impl VariantRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            variants: IndexMap::new(),
        }
    }

    /// Process-wide registry of the recurring task variants
    ///
    /// Built on first use and immutable afterwards.
    #[inline]
    #[must_use]
    pub fn recurring_tasks() -> &'static Self {
        &RECURRING_TASKS
    }

    /// Register a variant
    ///
    /// # Errors
    /// Returns error if the discriminator is already registered, or if the
    /// variant declares a field with a different kind than an existing
    /// variant declares for the same name
    pub fn register(&mut self, variant: Variant) -> Result<(), RegistryError> {
        if self.variants.contains_key(variant.name()) {
            return Err(RegistryError::DuplicateVariant(variant.name().to_string()));
        }
        for (field, spec) in variant.declared_fields() {
            if let Some(existing) = self.field_kind(field.as_str()) {
                if existing != spec.kind {
                    return Err(RegistryError::KindConflict {
                        field: field.to_string(),
                        first: existing,
                        second: spec.kind,
                    });
                }
            }
        }
        self.variants.insert(variant.name().to_string(), variant);
        Ok(())
    }

    /// Resolve a discriminator
    ///
    /// # Errors
    /// Returns `UnknownVariant` if no variant has this discriminator
    #[inline]
    pub fn lookup(&self, discriminator: &str) -> Result<&Variant, RegistryError> {
        self.variants
            .get(discriminator)
            .ok_or_else(|| RegistryError::UnknownVariant(discriminator.to_string()))
    }

    /// Check if a discriminator is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, discriminator: &str) -> bool {
        self.variants.contains_key(discriminator)
    }

    /// Resolve a wire schema URN
    #[must_use]
    pub fn variant_for_schema(&self, urn: &str) -> Option<&Variant> {
        self.variants.values().find(|v| v.schema_urn() == urn)
    }

    /// Kind of a field as declared by any registered variant
    #[must_use]
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.variants.values().find_map(|v| v.kind_of(field))
    }

    /// Iterate over variants in registration order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.values()
    }

    /// Number of registered variants
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Registry and variant declaration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No variant with this discriminator
    #[error("unknown variant: '{0}'")]
    UnknownVariant(String),

    /// Discriminator registered twice
    #[error("variant already registered: '{0}'")]
    DuplicateVariant(String),

    /// Variant without a name
    #[error("variant name is empty")]
    EmptyName,

    /// Invalid field declaration
    #[error("invalid field in variant '{variant}': {reason}")]
    InvalidField { variant: String, reason: String },

    /// Field declared twice
    #[error("field '{field}' declared twice in variant '{variant}'")]
    DuplicateField { variant: String, field: String },

    /// Default or constraint references an undeclared field
    #[error("field '{field}' is not declared by variant '{variant}'")]
    UndeclaredField { variant: String, field: String },

    /// Required fields cannot carry a default
    #[error("required field '{field}' of variant '{variant}' has a default")]
    DefaultOnRequired { variant: String, field: String },

    /// Default value kind differs from the declared kind
    #[error("default for '{field}' in variant '{variant}' is {found}, expected {expected}")]
    DefaultKindMismatch {
        variant: String,
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Two variants declare the same field with different kinds
    #[error("field '{field}' declared as both {first} and {second}")]
    KindConflict {
        field: String,
        first: FieldKind,
        second: FieldKind,
    },
}
