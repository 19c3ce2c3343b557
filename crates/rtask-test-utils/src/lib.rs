//! Testing utilities for the recurring task workspace
//!
//! Shared fixtures, record builders and proptest strategies.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use proptest::prelude::*;
use rtask_record::{FieldKind, FieldName, FieldValue, TaskRecord};
use rtask_variant::{Constraint, Variant, VariantRegistry};

pub fn field(name: &'static str) -> FieldName {
    FieldName::from_static(name)
}

pub fn create_record(task_type: &str) -> TaskRecord {
    TaskRecord::new(task_type).unwrap()
}

pub fn catalog() -> &'static VariantRegistry {
    VariantRegistry::recurring_tasks()
}

pub fn variant(task_type: &str) -> &'static Variant {
    catalog().lookup(task_type).unwrap()
}

pub fn sample_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::String => FieldValue::from("value"),
        FieldKind::Bool => FieldValue::from(true),
        FieldKind::Integer => FieldValue::from(1_i64),
        FieldKind::List => FieldValue::list(["item"]),
        FieldKind::Set => FieldValue::set(["item"]),
    }
}

/// Smallest record that passes validation: every required field plus the
/// first member of each at-least-one-of group
pub fn create_minimal_record(variant: &Variant) -> TaskRecord {
    let mut record = create_record(variant.name());
    for name in variant.required_fields() {
        let kind = variant.kind_of(name.as_str()).unwrap();
        record.insert(name.clone(), sample_value(kind)).unwrap();
    }
    for constraint in variant.cross_field_constraints() {
        if let Constraint::AtLeastOneOf(fields) = constraint {
            let first = &fields[0];
            let kind = variant.kind_of(first.as_str()).unwrap();
            record.insert(first.clone(), sample_value(kind)).unwrap();
        }
    }
    record
}

/// How a server reports a stored record: string fields the record lacks
/// or clears come back as their default (or `""` without one), empty
/// collections are left out
pub fn server_echo(record: &TaskRecord, variant: &Variant) -> TaskRecord {
    let mut echoed = record.clone();
    for (name, spec) in variant.declared_fields() {
        match echoed.get(name.as_str()).cloned() {
            None if spec.kind == FieldKind::String => {
                echoed.insert(name.clone(), FieldValue::from("")).unwrap();
            }
            Some(value) if value.is_empty_string() => {
                let stored = variant.default_for(name.as_str()).cloned().unwrap_or(value);
                echoed.insert(name.clone(), stored).unwrap();
            }
            Some(value) if value.elements().is_some_and(|elements| elements.is_empty()) => {
                echoed.remove(name.as_str());
            }
            _ => {}
        }
    }
    echoed
}

pub fn arb_value(kind: FieldKind) -> BoxedStrategy<FieldValue> {
    match kind {
        FieldKind::String => "[a-z]{0,6}".prop_map(FieldValue::String).boxed(),
        FieldKind::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        FieldKind::Integer => (0_i64..1000).prop_map(FieldValue::Integer).boxed(),
        FieldKind::List => proptest::collection::vec("[a-d]", 0..5).prop_map(FieldValue::List).boxed(),
        FieldKind::Set => proptest::collection::btree_set("[a-d]", 0..5).prop_map(FieldValue::Set).boxed(),
    }
}

/// Records that validate against `variant`
///
/// Starts from [`create_minimal_record`] and sets any subset of the other
/// fields, never both sides of a conflicting pair. Optional strings may be
/// `""`, which clears them.
pub fn arb_valid_record(variant: &Variant) -> BoxedStrategy<TaskRecord> {
    let base = create_minimal_record(variant);
    let blocked: Vec<&FieldName> = variant
        .cross_field_constraints()
        .iter()
        .filter_map(|c| match c {
            Constraint::Conflicting(_, second) => Some(second),
            _ => None,
        })
        .collect();
    let candidates: Vec<(FieldName, FieldKind)> = variant
        .declared_fields()
        .filter(|(name, _)| !variant.is_required(name.as_str()) && !blocked.contains(name))
        .map(|(name, spec)| (name.clone(), spec.kind))
        .collect();

    let strategies: Vec<BoxedStrategy<Option<FieldValue>>> = candidates
        .iter()
        .map(|(_, kind)| proptest::option::of(arb_value(*kind)).boxed())
        .collect();

    strategies
        .prop_map(move |values| {
            let mut record = base.clone();
            for ((name, _), value) in candidates.iter().zip(values) {
                match value {
                    // keep the seeded at-least-one-of member set
                    Some(value) if value.is_empty_string() && record.contains(name.as_str()) => {}
                    Some(value) => {
                        record.insert(name.clone(), value).unwrap();
                    }
                    None => {}
                }
            }
            record
        })
        .boxed()
}

/// Any catalog variant paired with a valid record for it
pub fn arb_catalog_record() -> BoxedStrategy<(&'static Variant, TaskRecord)> {
    let variants: Vec<&'static Variant> = catalog().iter().collect();
    proptest::sample::select(variants)
        .prop_flat_map(|variant| arb_valid_record(variant).prop_map(move |record| (variant, record)))
        .boxed()
}
