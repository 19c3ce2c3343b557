//! Engine configuration

use serde::{Deserialize, Serialize};

/// How a desired record relates to the server object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Create allocates a new object; unset optional fields take their
    /// variant defaults
    #[default]
    Create,

    /// Create reconciles into an object that already exists; unset fields
    /// keep the server's value and required fields need not be repeated
    Adopt,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reconciliation mode
    #[serde(default)]
    pub mode: ReconcileMode,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With reconciliation mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adopt-mode configuration
    #[inline]
    #[must_use]
    pub fn adopt() -> Self {
        Self::new().with_mode(ReconcileMode::Adopt)
    }

    /// Check if adopting existing objects
    #[inline]
    #[must_use]
    pub fn is_adopt(&self) -> bool {
        self.mode == ReconcileMode::Adopt
    }
}
