//! Error types for the reconciliation engine
//!
//! Validation problems are not errors here: they are returned as data in
//! [`crate::Reconciliation::errors`] so they can be reported together. The
//! errors below are invariant-class: a defect in the engine or its caller,
//! fatal to the single operation.

use rtask_variant::RegistryError;

/// Main engine error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Discriminator not in the registry
    #[error("unknown task type: '{0}'")]
    UnknownVariant(String),

    /// Engine or caller broke an internal invariant
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Adopt mode was asked to reconcile without an existing object
    #[error("adopting an existing task requires its observed state")]
    AdoptRequiresObserved,

    /// Registry configuration error
    #[error("registry error: {0}")]
    Registry(RegistryError),
}

impl EngineError {
    /// Create invariant violation error
    #[inline]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Check if error indicates a defect rather than bad input
    #[inline]
    #[must_use]
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            Self::UnknownVariant(_) | Self::InvariantViolation(_) | Self::Registry(_)
        )
    }
}

impl From<RegistryError> for EngineError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::UnknownVariant(name) => Self::UnknownVariant(name),
            other => Self::Registry(other),
        }
    }
}
