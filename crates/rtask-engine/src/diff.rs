//! Minimal patch computation between desired and observed records

use crate::error::EngineError;
use rtask_record::{FieldName, FieldValue, PatchOperation, TaskRecord};
use rtask_variant::Variant;
use std::collections::BTreeSet;

/// Computes the smallest patch that moves `observed` to `desired`
///
/// Fields absent from the desired record are left alone: a partial record
/// never clears server state. Operations come out in the variant's
/// declaration order, shared fields first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffComputer;

impl DiffComputer {
    /// Create new diff computer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute patch operations
    ///
    /// # Errors
    /// Returns `InvariantViolation` when either record carries a field the
    /// variant does not allow, or when the two records (or the variant)
    /// disagree about a field's value kind
    pub fn diff(
        &self,
        desired: &TaskRecord,
        observed: &TaskRecord,
        variant: &Variant,
    ) -> Result<Vec<PatchOperation>, EngineError> {
        let names: BTreeSet<&FieldName> = desired.field_names().chain(observed.field_names()).collect();

        let mut ordered: Vec<(usize, &FieldName)> = Vec::with_capacity(names.len());
        for name in names {
            let position = variant.position(name.as_str()).ok_or_else(|| {
                EngineError::invariant(format!(
                    "field '{name}' is not applicable to variant '{}'",
                    variant.name()
                ))
            })?;
            ordered.push((position, name));
        }
        ordered.sort_unstable_by_key(|(position, _)| *position);

        let mut operations = Vec::new();
        for (_, field) in ordered {
            let Some(want) = desired.get(field.as_str()) else {
                continue;
            };
            let have = observed.get(field.as_str());
            Self::check_kinds(field, want, have, variant)?;
            Self::diff_field(field, want, have, &mut operations);
        }
        Ok(operations)
    }

    fn check_kinds(
        field: &FieldName,
        want: &FieldValue,
        have: Option<&FieldValue>,
        variant: &Variant,
    ) -> Result<(), EngineError> {
        if let Some(expected) = variant.kind_of(field.as_str()) {
            if want.kind() != expected {
                return Err(EngineError::invariant(format!(
                    "desired '{field}' is {} but variant '{}' declares {expected}",
                    want.kind(),
                    variant.name()
                )));
            }
        }
        if let Some(have) = have {
            if have.kind() != want.kind() {
                return Err(EngineError::invariant(format!(
                    "'{field}' is {} in desired but {} in observed",
                    want.kind(),
                    have.kind()
                )));
            }
        }
        Ok(())
    }

    fn diff_field(
        field: &FieldName,
        want: &FieldValue,
        have: Option<&FieldValue>,
        operations: &mut Vec<PatchOperation>,
    ) {
        match want {
            FieldValue::String(want_str) => {
                let have_str = have.and_then(FieldValue::as_str).unwrap_or("");
                if want_str != have_str {
                    operations.push(PatchOperation::replace(field.clone(), want.clone()));
                }
            }
            FieldValue::Bool(_) | FieldValue::Integer(_) => {
                if have != Some(want) {
                    operations.push(PatchOperation::replace(field.clone(), want.clone()));
                }
            }
            FieldValue::Set(want_set) => {
                let empty = BTreeSet::new();
                let have_set = match have {
                    Some(FieldValue::Set(set)) => set,
                    _ => &empty,
                };
                let removed: BTreeSet<String> = have_set.difference(want_set).cloned().collect();
                let added: BTreeSet<String> = want_set.difference(have_set).cloned().collect();
                if !removed.is_empty() {
                    operations.push(PatchOperation::remove_values(field.clone(), FieldValue::Set(removed)));
                }
                if !added.is_empty() {
                    operations.push(PatchOperation::add_values(field.clone(), FieldValue::Set(added)));
                }
            }
            FieldValue::List(want_list) => {
                let have_list: &[String] = match have {
                    Some(FieldValue::List(list)) => list,
                    _ => &[],
                };
                operations.extend(Self::diff_list(field, want_list, have_list));
            }
        }
    }

    /// Element-level list diff
    ///
    /// The server appends added values after the survivors. When that
    /// would not reproduce the desired order the whole list is replaced.
    fn diff_list(field: &FieldName, want: &[String], have: &[String]) -> Vec<PatchOperation> {
        let removed = unique_missing(have, want);
        let added = unique_missing(want, have);

        if removed.is_empty() && added.is_empty() {
            if want == have {
                return Vec::new();
            }
            return vec![PatchOperation::replace(field.clone(), FieldValue::List(want.to_vec()))];
        }

        let applied: Vec<&String> = have
            .iter()
            .filter(|value| !removed.contains(value))
            .chain(added.iter())
            .collect();
        if !applied.iter().copied().eq(want.iter()) {
            return vec![PatchOperation::replace(field.clone(), FieldValue::List(want.to_vec()))];
        }

        let mut operations = Vec::with_capacity(2);
        if !removed.is_empty() {
            operations.push(PatchOperation::remove_values(field.clone(), FieldValue::List(removed)));
        }
        if !added.is_empty() {
            operations.push(PatchOperation::add_values(field.clone(), FieldValue::List(added)));
        }
        operations
    }
}

/// Values of `from` that do not occur in `other`, first occurrence order
fn unique_missing(from: &[String], other: &[String]) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for value in from {
        if !other.contains(value) && !missing.contains(value) {
            missing.push(value.clone());
        }
    }
    missing
}
