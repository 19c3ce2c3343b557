//! Recurring Task Records
//!
//! Sparse, typed records and the field-level patch operations computed
//! between them.
//!
//! # Core Concepts
//!
//! - [`TaskRecord`]: Flat mapping from field name to typed value, plus the discriminator
//! - [`FieldName`]: Validated snake_case field identifier with a kebab-case wire form
//! - [`FieldValue`]/[`FieldKind`]: String, bool, integer, list or set values
//! - [`PatchOperation`]: One minimal field-level change
//!
//! # Example
//!
//! ```rust
//! use rtask_record::{FieldValue, TaskRecord};
//!
//! let record = TaskRecord::new("backup")?
//!     .with("backup_directory", "bak")?
//!     .with("included_backend_id", FieldValue::set(["userRoot"]))?;
//!
//! assert_eq!(record.task_type(), "backup");
//! assert_eq!(record.len(), 2);
//! # Ok::<(), rtask_record::RecordError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod field;
mod patch;
mod record;
mod value;

pub use field::{FieldName, FieldNameError, DISCRIMINATOR};
pub use patch::{PatchKind, PatchOperation};
pub use record::{RecordError, TaskRecord};
pub use value::{FieldKind, FieldValue, ValueError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn record_fields_and_patch_share_names() {
        let record = TaskRecord::new("ldif-export")
            .unwrap()
            .with("backend_id", FieldValue::set(["userRoot"]))
            .unwrap();

        let (name, value) = record.fields().next().unwrap();
        let op = PatchOperation::replace(name.clone(), value.clone());

        assert_eq!(op.field().wire_name(), "backend-id");
        assert_eq!(op.value().kind(), FieldKind::Set);
    }

    proptest! {
        #[test]
        fn wire_name_round_trips(parts in proptest::collection::vec("[a-z][a-z0-9]{0,6}", 1..5)) {
            let name = FieldName::new(parts.join("_")).unwrap();
            let back = FieldName::from_wire(&name.wire_name()).unwrap();
            prop_assert_eq!(back, name);
        }

        #[test]
        fn set_json_decodes_to_same_set(items in proptest::collection::btree_set("[a-zA-Z]{1,8}", 0..6)) {
            let value = FieldValue::Set(items);
            let decoded = FieldValue::from_json(FieldKind::Set, &value.to_json()).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}
