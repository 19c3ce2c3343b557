//! State normalization
//!
//! The one place where "empty string" and "absent" are made the same, and
//! where server-computed collections become explicit empty containers.

use crate::error::EngineError;
use rtask_record::{FieldName, FieldValue, TaskRecord};
use rtask_variant::{Variant, VariantRegistry};

/// Canonicalizer for records read back from the server
///
/// # Rules
/// - A string field holding `""` is removed
/// - A collection field the variant declares but the record lacks is set
///   to an empty collection of its kind
///
/// Normalizing twice gives the same record as normalizing once.
#[derive(Debug, Clone, Copy)]
pub struct StateNormalizer<'r> {
    registry: &'r VariantRegistry,
}

impl<'r> StateNormalizer<'r> {
    /// Create normalizer over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: &'r VariantRegistry) -> Self {
        Self { registry }
    }

    /// Normalize a record, resolving its variant from the discriminator
    ///
    /// # Errors
    /// Returns `UnknownVariant` if the discriminator is not registered
    pub fn normalize(&self, record: &TaskRecord) -> Result<TaskRecord, EngineError> {
        let variant = self.registry.lookup(record.task_type())?;
        Ok(Self::normalize_for(record, variant))
    }

    /// Normalize a record against an already resolved variant
    #[must_use]
    pub fn normalize_for(record: &TaskRecord, variant: &Variant) -> TaskRecord {
        let mut normalized = record.clone();

        let empty_strings: Vec<FieldName> = record
            .fields()
            .filter(|(_, value)| value.is_empty_string())
            .map(|(name, _)| name.clone())
            .collect();
        for name in empty_strings {
            normalized.remove(name.as_str());
        }

        for (field, spec) in variant.declared_fields() {
            if normalized.contains(field.as_str()) {
                continue;
            }
            if let Some(empty) = FieldValue::empty_of(spec.kind) {
                if let Err(e) = normalized.insert(field.clone(), empty) {
                    tracing::error!(field = %field, error = %e, "collection could not be normalized");
                }
            }
        }

        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rtask_record::FieldKind;
    use std::collections::BTreeSet;

    fn registry() -> VariantRegistry {
        let mut registry = VariantRegistry::new();
        registry
            .register(
                Variant::builder("generate-server-profile")
                    .required("profile_directory", FieldKind::String)
                    .optional("include_path", FieldKind::List)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn empty_string_becomes_absent() {
        let registry = registry();
        let record = TaskRecord::new("generate-server-profile")
            .unwrap()
            .with("description", "")
            .unwrap()
            .with("profile_directory", "profiles")
            .unwrap();

        let normalized = StateNormalizer::new(&registry).normalize(&record).unwrap();
        assert!(!normalized.contains("description"));
        assert_eq!(normalized.get("profile_directory"), Some(&FieldValue::from("profiles")));
    }

    #[test]
    fn absent_collections_become_empty() {
        let registry = registry();
        let record = TaskRecord::new("generate-server-profile").unwrap();
        let normalized = StateNormalizer::new(&registry).normalize(&record).unwrap();

        assert_eq!(normalized.get("include_path"), Some(&FieldValue::List(Vec::new())));
        assert_eq!(normalized.get("email_on_start"), Some(&FieldValue::Set(BTreeSet::new())));
        assert!(!normalized.contains("alert_on_start"));
    }

    #[test]
    fn present_collections_untouched() {
        let registry = registry();
        let record = TaskRecord::new("generate-server-profile")
            .unwrap()
            .with("include_path", FieldValue::list(["b", "a"]))
            .unwrap();
        let normalized = StateNormalizer::new(&registry).normalize(&record).unwrap();
        assert_eq!(normalized.get("include_path"), Some(&FieldValue::list(["b", "a"])));
    }

    #[test]
    fn normalize_is_idempotent() {
        let registry = registry();
        let record = TaskRecord::new("generate-server-profile")
            .unwrap()
            .with("description", "")
            .unwrap();
        let normalizer = StateNormalizer::new(&registry);
        let once = normalizer.normalize(&record).unwrap();
        let twice = normalizer.normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_variant_is_error() {
        let registry = registry();
        let record = TaskRecord::new("backup").unwrap();
        let result = StateNormalizer::new(&registry).normalize(&record);
        assert_eq!(result, Err(EngineError::UnknownVariant("backup".to_string())));
    }
}
