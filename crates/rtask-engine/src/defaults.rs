//! Default injection
//!
//! Fills absent optional fields with the active variant's defaults so a
//! freshly planned record matches what the server reports after applying
//! its own defaults. A defaulted string holding `""` counts as absent: the
//! server answers a cleared attribute with its default.

use rtask_record::TaskRecord;
use rtask_variant::Variant;

/// Injector of variant-scoped defaults
///
/// Keys strictly off the variant it is given; there is no global default
/// table. Fields without a registered default stay absent and the server
/// decides their value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInjector;

impl DefaultInjector {
    /// Create new injector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy of `record` with every missing or cleared defaulted field set
    #[must_use]
    pub fn inject_defaults(&self, record: &TaskRecord, variant: &Variant) -> TaskRecord {
        Self::fill(record, variant, true)
    }

    /// Copy of `record` with only cleared defaulted fields set
    ///
    /// Used in adopt mode, where absent fields stay absent.
    #[must_use]
    pub fn restore_cleared(&self, record: &TaskRecord, variant: &Variant) -> TaskRecord {
        Self::fill(record, variant, false)
    }

    fn fill(record: &TaskRecord, variant: &Variant, fill_absent: bool) -> TaskRecord {
        let mut resolved = record.clone();
        for (field, default) in variant.defaults() {
            let apply = match resolved.get(field.as_str()) {
                None => fill_absent,
                Some(value) => value.is_empty_string(),
            };
            if !apply {
                continue;
            }
            if let Err(e) = resolved.insert(field.clone(), default.clone()) {
                tracing::error!(field = %field, error = %e, "default could not be applied");
            }
        }
        resolved
    }
}
