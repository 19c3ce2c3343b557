use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rtask_engine::prelude::*;
use rtask_engine::DiffComputer;
use rtask_test_utils::{
    arb_catalog_record, arb_valid_record, catalog, create_minimal_record, create_record, field, server_echo, variant,
};
use rtask_variant::Variant;
use std::collections::BTreeSet;

/// Applies a patch the way the server does
fn apply(record: &TaskRecord, patch: &[PatchOperation]) -> TaskRecord {
    let mut result = record.clone();
    for op in patch {
        let name = op.field().clone();
        let current = result.get(name.as_str()).cloned();
        let next = match (op.kind(), op.value(), current) {
            (PatchKind::Replace, FieldValue::String(s), _) if s.is_empty() => None,
            (PatchKind::Replace, value, _) => Some(value.clone()),
            (PatchKind::AddValues, FieldValue::Set(add), Some(FieldValue::Set(mut have))) => {
                have.extend(add.iter().cloned());
                Some(FieldValue::Set(have))
            }
            (PatchKind::AddValues, FieldValue::List(add), Some(FieldValue::List(mut have))) => {
                have.extend(add.iter().cloned());
                Some(FieldValue::List(have))
            }
            (PatchKind::AddValues, value, None) => Some(value.clone()),
            (PatchKind::RemoveValues, FieldValue::Set(remove), Some(FieldValue::Set(have))) => {
                Some(FieldValue::Set(have.difference(remove).cloned().collect()))
            }
            (PatchKind::RemoveValues, FieldValue::List(remove), Some(FieldValue::List(have))) => {
                Some(FieldValue::List(have.into_iter().filter(|v| !remove.contains(v)).collect()))
            }
            (kind, value, current) => panic!("cannot apply {kind:?} {value:?} to {current:?}"),
        };
        match next {
            Some(value) => {
                result.insert(name, value).unwrap();
            }
            None => {
                result.remove(name.as_str());
            }
        }
    }
    result
}

fn plan(desired: &TaskRecord) -> Reconciliation {
    VariantDispatcher::recurring_tasks().reconcile(desired, None).unwrap()
}

// Scenario A
#[test]
fn backup_create_with_directory() {
    let desired = create_record("backup").with("backup_directory", "bak").unwrap();
    let result = plan(&desired);

    assert!(result.errors.is_empty());
    assert!(result.patch.is_empty());
    for (name, value) in [
        ("backup_directory", FieldValue::from("bak")),
        ("cancel_on_task_dependency_failure", FieldValue::Bool(false)),
        ("alert_on_start", FieldValue::Bool(false)),
        ("alert_on_success", FieldValue::Bool(false)),
        ("alert_on_failure", FieldValue::Bool(true)),
        ("compress", FieldValue::Bool(false)),
        ("encrypt", FieldValue::Bool(false)),
        ("sign", FieldValue::Bool(false)),
    ] {
        assert_eq!(result.record.get(name), Some(&value), "{name}");
    }
    assert!(!result.record.contains("included_backend_id"));
}

#[test]
fn cleared_defaulted_directory_settles_on_server_default() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    let desired = create_record("backup").with("backup_directory", "").unwrap();

    let planned = dispatcher.reconcile(&desired, None).unwrap();
    assert_eq!(planned.record.get("backup_directory"), Some(&FieldValue::from("bak")));

    let observed = server_echo(&planned.record, variant("backup"));
    assert_eq!(observed.get("backup_directory"), Some(&FieldValue::from("bak")));
    let update = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert!(update.is_noop(), "{:?}", update.patch);

    let adopt = dispatcher.with_mode(ReconcileMode::Adopt);
    assert!(adopt.reconcile(&desired, Some(&observed)).unwrap().is_noop());
}

// Scenario B
#[test]
fn delay_without_wait_condition() {
    let result = plan(&create_record("delay"));

    assert!(result.patch.is_empty());
    assert_eq!(
        result.errors,
        vec![ValidationError::MissingOneOf {
            fields: vec![
                field("sleep_duration"),
                field("duration_to_wait_for_work_queue_idle"),
                field("ldap_url_for_search_expected_to_return_entries"),
            ],
        }]
    );
}

// Scenario C
#[test]
fn ldif_export_conflicting_backends() {
    let desired = create_record("ldif-export")
        .with("backend_id", FieldValue::set(["a"]))
        .unwrap()
        .with("exclude_backend_id", FieldValue::set(["b"]))
        .unwrap();
    let result = plan(&desired);

    assert_eq!(
        result.errors,
        vec![ValidationError::ConflictingFields {
            first: field("backend_id"),
            second: field("exclude_backend_id"),
        }]
    );
}

// Scenario D
#[test]
fn backup_backend_set_edit() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    let desired = create_record("backup")
        .with("included_backend_id", FieldValue::set(["b", "c"]))
        .unwrap();
    let observed = plan(&desired)
        .record
        .with("included_backend_id", FieldValue::set(["a", "b"]))
        .unwrap();

    let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert_eq!(
        result.patch,
        vec![
            PatchOperation::remove_values(field("included_backend_id"), FieldValue::set(["a"])),
            PatchOperation::add_values(field("included_backend_id"), FieldValue::set(["c"])),
        ]
    );
}

#[test]
fn every_variant_round_trips_through_create() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    for variant in catalog().iter() {
        let desired = create_minimal_record(variant);
        let planned = dispatcher.reconcile(&desired, None).unwrap();
        assert!(planned.is_valid(), "{}: {:?}", variant.name(), planned.errors);

        let observed = server_echo(&planned.record, variant);
        let update = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
        assert!(update.is_noop(), "{}: {:?}", variant.name(), update.patch);
    }
}

#[test]
fn every_variant_rejects_foreign_fields_before_diffing() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    for variant in catalog().iter() {
        let foreign = if variant.kind_of("command_path").is_some() { "profile_directory" } else { "command_path" };
        let desired = create_minimal_record(variant).with(foreign, "/x").unwrap();
        let observed = plan(&create_minimal_record(variant)).record;

        let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
        assert!(result.patch.is_empty(), "{}", variant.name());
        assert!(
            result.errors.iter().any(|e| matches!(e, ValidationError::FieldNotApplicable { .. })),
            "{}",
            variant.name()
        );
    }
}

#[test]
fn changing_one_field_patches_one_field() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    let base = create_record("exec").with("command_path", "/bin/backup.sh").unwrap();
    let observed = plan(&base).record;

    let desired = base.with("log_command_output", true).unwrap();
    let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert_eq!(
        result.patch,
        vec![PatchOperation::replace(field("log_command_output"), FieldValue::Bool(true))]
    );
}

#[test]
fn clearing_description_sends_empty_replace() {
    let dispatcher = VariantDispatcher::recurring_tasks();
    let observed = plan(&create_record("leave-lockdown-mode").with("description", "nightly").unwrap()).record;
    let desired = create_record("leave-lockdown-mode").with("description", "").unwrap();

    let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert_eq!(
        result.patch,
        vec![PatchOperation::replace(field("description"), FieldValue::from(""))]
    );
}

#[test]
fn adopt_leaves_unset_fields_to_server() {
    let dispatcher = VariantDispatcher::with_config(catalog(), EngineConfig::adopt());
    let observed = create_record("file-retention")
        .with("target_directory", "logs")
        .unwrap()
        .with("filename_pattern", "access.*")
        .unwrap()
        .with("timestamp_format", "generalized-time")
        .unwrap()
        .with("retain_file_count", 10_i64)
        .unwrap()
        .with("alert_on_failure", false)
        .unwrap();
    let desired = create_record("file-retention").with("retain_file_count", 5_i64).unwrap();

    let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert!(result.is_valid(), "{:?}", result.errors);
    assert_eq!(
        result.patch,
        vec![PatchOperation::replace(field("retain_file_count"), FieldValue::Integer(5))]
    );
}

#[test]
fn adopt_still_checks_applicability() {
    let dispatcher = VariantDispatcher::with_config(catalog(), EngineConfig::adopt());
    let observed = create_minimal_record(variant("exec"));
    let desired = create_record("exec").with("reason", "maintenance").unwrap();

    let result = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
    assert_eq!(
        result.errors,
        vec![ValidationError::FieldNotApplicable {
            field: field("reason"),
            variant: "exec".to_string(),
        }]
    );
}

fn arb_desired_and_observed() -> impl Strategy<Value = (&'static Variant, TaskRecord, TaskRecord)> {
    proptest::sample::select(catalog().iter().collect::<Vec<_>>()).prop_flat_map(|variant| {
        (arb_valid_record(variant), arb_valid_record(variant))
            .prop_map(move |(desired, observed)| (variant, desired, observed))
    })
}

proptest! {
    #[test]
    fn reconcile_is_idempotent((variant, desired) in arb_catalog_record()) {
        let dispatcher = VariantDispatcher::recurring_tasks();
        let planned = dispatcher.reconcile(&desired, None).unwrap();
        prop_assert!(planned.is_valid(), "{:?}", planned.errors);

        let observed = server_echo(&planned.record, variant);
        let update = dispatcher.reconcile(&desired, Some(&observed)).unwrap();
        prop_assert!(update.patch.is_empty(), "{:?}", update.patch);
    }

    #[test]
    fn normalize_is_idempotent((variant, record) in arb_catalog_record()) {
        let once = StateNormalizer::normalize_for(&record, variant);
        let twice = StateNormalizer::normalize_for(&once, variant);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn patch_reaches_desired_state((variant, desired, observed) in arb_desired_and_observed()) {
        let differ = DiffComputer::new();
        let observed = StateNormalizer::normalize_for(&observed, variant);
        let patch = differ.diff(&desired, &observed, variant).unwrap();

        let applied = StateNormalizer::normalize_for(&apply(&observed, &patch), variant);
        prop_assert!(differ.diff(&desired, &applied, variant).unwrap().is_empty());
    }

    #[test]
    fn patch_touches_only_changed_fields((variant, desired, observed) in arb_desired_and_observed()) {
        let observed = StateNormalizer::normalize_for(&observed, variant);
        let patch = DiffComputer::new().diff(&desired, &observed, variant).unwrap();

        let mut replaced = BTreeSet::new();
        for op in &patch {
            let name = op.field().as_str();
            let want = desired.get(name);
            prop_assert!(want.is_some(), "{} not in desired", name);
            prop_assert_ne!(want, observed.get(name));
            prop_assert!(!op.value().elements().is_some_and(|e| e.is_empty()) || op.kind() == PatchKind::Replace);
            if op.kind() == PatchKind::Replace {
                prop_assert!(replaced.insert(name.to_string()), "{} replaced twice", name);
            }
        }
    }
}
