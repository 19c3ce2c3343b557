//! Recurring Task Variants
//!
//! The variant table behind the combined recurring task resource: one
//! descriptor per task kind, consulted once per operation instead of
//! per-kind code paths.
//!
//! # Core Concepts
//!
//! - [`Variant`]: Immutable rule set of one task kind (fields, kinds, defaults, constraints)
//! - [`VariantRegistry`]: Read-only catalog resolving a discriminator into its variant
//! - [`Constraint`]: Cross-field rules (conflicts, at-least-one-of, variant-conditional)
//! - [`FieldApplicabilityValidator`]: Accumulating validation of a record against its variant
//! - [`decode_record`]: JSON object → [`rtask_record::TaskRecord`] using declared kinds
//!
//! # Example
//!
//! ```rust
//! use rtask_record::TaskRecord;
//! use rtask_variant::{FieldApplicabilityValidator, VariantRegistry};
//!
//! let registry = VariantRegistry::recurring_tasks();
//! let variant = registry.lookup("delay").unwrap();
//!
//! let record = TaskRecord::new("delay").unwrap();
//! let errors = FieldApplicabilityValidator::new().validate(&record, variant);
//! assert_eq!(errors.len(), 1); // none of the wait conditions is set
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod constraint;
mod decode;
mod registry;
mod validation;
mod variant;

pub use catalog::recurring_tasks;
pub use constraint::Constraint;
pub use decode::{decode_record, DecodeError, KeyStyle};
pub use registry::{RegistryError, VariantRegistry};
pub use validation::{FieldApplicabilityValidator, ValidationError, ValidationOptions};
pub use variant::{FieldSpec, Presence, Variant, VariantBuilder, SCHEMA_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rtask_record::{FieldValue, TaskRecord};

    #[test]
    fn delay_without_wait_condition() {
        let registry = VariantRegistry::recurring_tasks();
        let variant = registry.lookup("delay").unwrap();
        let errors = FieldApplicabilityValidator::new().validate(&TaskRecord::new("delay").unwrap(), variant);

        assert_eq!(errors.len(), 1);
        let ValidationError::MissingOneOf { fields } = &errors[0] else {
            panic!("expected MissingOneOf, got {:?}", errors[0]);
        };
        let names: Vec<_> = fields.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "sleep_duration",
                "duration_to_wait_for_work_queue_idle",
                "ldap_url_for_search_expected_to_return_entries",
            ]
        );
    }

    #[test]
    fn ldif_export_backend_conflict() {
        let registry = VariantRegistry::recurring_tasks();
        let record = TaskRecord::new("ldif-export")
            .unwrap()
            .with("backend_id", FieldValue::set(["a"]))
            .unwrap()
            .with("exclude_backend_id", FieldValue::set(["b"]))
            .unwrap();

        let errors = FieldApplicabilityValidator::new().validate(&record, registry.lookup("ldif-export").unwrap());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::ConflictingFields { first, second }
                if first.as_str() == "backend_id" && second.as_str() == "exclude_backend_id"
        ));
    }

    #[test]
    fn decode_then_validate_reports_foreign_field() {
        let registry = VariantRegistry::recurring_tasks();
        let object = serde_json::json!({"type": "exec", "command_path": "/bin/true", "backup_directory": "bak"});
        let record = decode_record(object.as_object().unwrap(), registry, KeyStyle::Snake).unwrap();

        let errors = FieldApplicabilityValidator::new().validate(&record, registry.lookup("exec").unwrap());
        assert!(matches!(&errors[..], [ValidationError::FieldNotApplicable { .. }]));
    }
}
