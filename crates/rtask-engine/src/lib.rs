//! Recurring Task Engine
//!
//! Turns a desired task record into either validation errors, a fully
//! defaulted record to create, or the minimal patch against the server's
//! current object.
//!
//! - Validates field applicability per variant
//! - Injects variant-scoped defaults
//! - Normalizes server state (empty string ≡ absent, explicit empty collections)
//! - Computes declaration-ordered patches
//!
//! # Example
//!
//! ```rust
//! use rtask_engine::prelude::*;
//!
//! let dispatcher = VariantDispatcher::recurring_tasks();
//! let desired = TaskRecord::new("exec").unwrap().with("command_path", "/bin/true").unwrap();
//!
//! let planned = dispatcher.reconcile(&desired, None).unwrap();
//! assert!(planned.is_valid());
//!
//! // Pretend the server stored exactly what we planned.
//! let observed = planned.record.clone();
//! let update = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
//! assert!(update.is_noop());
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod defaults;
pub mod diff;
pub mod dispatcher;
pub mod error;
pub mod normalize;

pub use config::{EngineConfig, ReconcileMode};
pub use defaults::DefaultInjector;
pub use diff::DiffComputer;
pub use dispatcher::{Reconciliation, VariantDispatcher};
pub use error::EngineError;
pub use normalize::StateNormalizer;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{
        EngineConfig, EngineError, ReconcileMode, Reconciliation, StateNormalizer, VariantDispatcher,
    };
    pub use rtask_record::{FieldName, FieldValue, PatchKind, PatchOperation, TaskRecord};
    pub use rtask_variant::{ValidationError, VariantRegistry};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
