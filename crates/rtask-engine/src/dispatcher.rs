//! Variant dispatch and the reconcile pipeline

use crate::config::{EngineConfig, ReconcileMode};
use crate::defaults::DefaultInjector;
use crate::diff::DiffComputer;
use crate::error::EngineError;
use crate::normalize::StateNormalizer;
use rtask_record::{PatchOperation, TaskRecord};
use rtask_variant::{FieldApplicabilityValidator, ValidationError, ValidationOptions, VariantRegistry};
use serde::Serialize;

/// Result of reconciling one desired record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Resolved desired record (defaults applied in create mode)
    pub record: TaskRecord,
    /// Operations moving the observed object to `record`
    pub patch: Vec<PatchOperation>,
    /// Validation errors; when non-empty `patch` is empty
    pub errors: Vec<ValidationError>,
}

impl Reconciliation {
    fn rejected(record: &TaskRecord, errors: Vec<ValidationError>) -> Self {
        Self {
            record: record.clone(),
            patch: Vec::new(),
            errors,
        }
    }

    fn accepted(record: TaskRecord, patch: Vec<PatchOperation>) -> Self {
        Self {
            record,
            patch,
            errors: Vec::new(),
        }
    }

    /// Check if the desired record passed validation
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if nothing needs to be sent to the server
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.is_valid() && self.patch.is_empty()
    }
}

/// Entry point of the engine
///
/// Resolves the variant once per call and threads it through validation,
/// default injection, normalization and diffing. Holds no mutable state,
/// so one dispatcher can serve concurrent reconciles.
#[derive(Debug, Clone, Copy)]
pub struct VariantDispatcher<'r> {
    registry: &'r VariantRegistry,
    config: EngineConfig,
    validator: FieldApplicabilityValidator,
    injector: DefaultInjector,
    differ: DiffComputer,
}

impl VariantDispatcher<'static> {
    /// Dispatcher over the built-in recurring task catalog
    #[must_use]
    pub fn recurring_tasks() -> Self {
        Self::new(VariantRegistry::recurring_tasks())
    }
}

impl<'r> VariantDispatcher<'r> {
    /// Create dispatcher with default configuration
    #[must_use]
    pub fn new(registry: &'r VariantRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Create dispatcher with explicit configuration
    #[must_use]
    pub fn with_config(registry: &'r VariantRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            validator: FieldApplicabilityValidator::new(),
            injector: DefaultInjector::new(),
            differ: DiffComputer::new(),
        }
    }

    /// Same dispatcher switched to another mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.config = self.config.with_mode(mode);
        self
    }

    /// Reconcile a desired record against the server's current object
    ///
    /// `observed` is `None` on create. Validation problems come back in
    /// [`Reconciliation::errors`]; only invariant-class problems are `Err`.
    ///
    /// # Errors
    /// - `UnknownVariant` if the discriminator is not registered
    /// - `InvariantViolation` if `observed` has another discriminator or
    ///   carries fields the variant does not allow
    /// - `AdoptRequiresObserved` in adopt mode without `observed`
    pub fn reconcile(
        &self,
        desired: &TaskRecord,
        observed: Option<&TaskRecord>,
    ) -> Result<Reconciliation, EngineError> {
        let span = tracing::debug_span!("reconcile", task_type = desired.task_type(), mode = ?self.config.mode);
        let _guard = span.enter();

        let variant = self.registry.lookup(desired.task_type()).map_err(|e| {
            tracing::error!("Cannot dispatch record: {}", e);
            EngineError::from(e)
        })?;

        if let Some(observed) = observed {
            if observed.task_type() != desired.task_type() {
                let error = EngineError::invariant(format!(
                    "observed task type '{}' does not match desired '{}'",
                    observed.task_type(),
                    desired.task_type()
                ));
                tracing::error!("{}", error);
                return Err(error);
            }
        }

        let adopt = self.config.is_adopt();
        if adopt && observed.is_none() {
            return Err(EngineError::AdoptRequiresObserved);
        }

        let options = if adopt {
            ValidationOptions::adopt()
        } else {
            ValidationOptions::default()
        };
        let errors = self.validator.validate_with(desired, variant, options);
        if !errors.is_empty() {
            tracing::warn!("Validation failed for '{}': {} error(s)", variant.name(), errors.len());
            return Ok(Reconciliation::rejected(desired, errors));
        }

        let resolved = if adopt {
            self.injector.restore_cleared(desired, variant)
        } else {
            self.injector.inject_defaults(desired, variant)
        };

        let Some(observed) = observed else {
            tracing::debug!("No observed state, planning create with {} field(s)", resolved.len());
            return Ok(Reconciliation::accepted(resolved, Vec::new()));
        };

        let observed = StateNormalizer::normalize_for(observed, variant);
        let patch = self.differ.diff(&resolved, &observed, variant).map_err(|e| {
            tracing::error!("Diff failed: {}", e);
            e
        })?;

        if patch.is_empty() {
            tracing::info!("no changes");
        } else {
            tracing::info!("Computed {} patch operation(s)", patch.len());
        }
        Ok(Reconciliation::accepted(resolved, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rtask_record::{FieldName, FieldValue};

    fn backup() -> TaskRecord {
        TaskRecord::new("backup").unwrap().with("backup_directory", "bak").unwrap()
    }

    #[test]
    fn create_returns_defaulted_record() {
        let dispatcher = VariantDispatcher::recurring_tasks();
        let result = dispatcher.reconcile(&backup(), None).unwrap();

        assert!(result.is_noop());
        assert_eq!(result.record.get("compress"), Some(&FieldValue::Bool(false)));
        assert_eq!(result.record.get("alert_on_failure"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn validation_errors_skip_patch() {
        let dispatcher = VariantDispatcher::recurring_tasks();
        let desired = backup().with("ldif_directory", "ldif").unwrap();
        let observed = backup();

        let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
        assert!(!result.is_valid());
        assert!(result.patch.is_empty());
        assert_eq!(
            result.errors,
            vec![ValidationError::FieldNotApplicable {
                field: FieldName::from_static("ldif_directory"),
                variant: "backup".to_string(),
            }]
        );
    }

    #[test]
    fn discriminator_mismatch_is_invariant() {
        let dispatcher = VariantDispatcher::recurring_tasks();
        let observed = TaskRecord::new("ldif-export").unwrap();
        let result = dispatcher.reconcile(&backup(), Some(&observed));
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn unknown_variant_is_error() {
        let dispatcher = VariantDispatcher::recurring_tasks();
        let desired = TaskRecord::new("reindex").unwrap();
        assert_eq!(
            dispatcher.reconcile(&desired, None),
            Err(EngineError::UnknownVariant("reindex".to_string()))
        );
    }

    #[test]
    fn adopt_requires_observed() {
        let dispatcher = VariantDispatcher::recurring_tasks().with_mode(ReconcileMode::Adopt);
        assert_eq!(
            dispatcher.reconcile(&backup(), None),
            Err(EngineError::AdoptRequiresObserved)
        );
    }

    #[test]
    fn adopt_skips_required_and_defaults() {
        let dispatcher = VariantDispatcher::recurring_tasks().with_mode(ReconcileMode::Adopt);
        let desired = TaskRecord::new("backup").unwrap().with("compress", true).unwrap();
        let observed = backup().with("compress", false).unwrap().with("alert_on_failure", false).unwrap();

        let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
        assert!(result.is_valid());
        assert_eq!(
            result.patch,
            vec![PatchOperation::replace(FieldName::from_static("compress"), FieldValue::Bool(true))]
        );
        assert!(!result.record.contains("alert_on_failure"));
    }
}
