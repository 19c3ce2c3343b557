//! Recurring task catalog
//!
//! Declares the twelve recurring task variants of the directory server.

use crate::constraint::Constraint;
use crate::registry::{RegistryError, VariantRegistry};
use crate::variant::Variant;
use rtask_record::FieldKind::{Integer, List, Set, String as Str};

/// Completion state used when a task gives up
const STOPPED_BY_ERROR: &str = "stopped-by-error";

/// Build the registry of all recurring task variants
///
/// # Errors
/// Returns error if a declaration is inconsistent
pub fn recurring_tasks() -> Result<VariantRegistry, RegistryError> {
    let mut registry = VariantRegistry::new();
    for variant in [
        generate_server_profile()?,
        leave_lockdown_mode()?,
        backup()?,
        delay()?,
        statically_defined()?,
        collect_support_data()?,
        ldif_export()?,
        enter_lockdown_mode()?,
        audit_data_security()?,
        exec()?,
        file_retention()?,
        third_party()?,
    ] {
        registry.register(variant)?;
    }
    Ok(registry)
}

fn generate_server_profile() -> Result<Variant, RegistryError> {
    Variant::builder("generate-server-profile")
        .required("profile_directory", Str)
        .optional("include_path", List)
        .optional("retain_previous_profile_count", Integer)
        .build()
}

fn leave_lockdown_mode() -> Result<Variant, RegistryError> {
    Variant::builder("leave-lockdown-mode").optional("reason", Str).build()
}

fn enter_lockdown_mode() -> Result<Variant, RegistryError> {
    Variant::builder("enter-lockdown-mode").optional("reason", Str).build()
}

fn backup() -> Result<Variant, RegistryError> {
    Variant::builder("backup")
        .optional_default("backup_directory", "bak")
        .optional("included_backend_id", Set)
        .optional("excluded_backend_id", Set)
        .optional_default("compress", false)
        .optional_default("encrypt", false)
        .optional("encryption_settings_definition_id", Str)
        .optional_default("sign", false)
        .optional("retain_previous_full_backup_count", Integer)
        .optional("retain_previous_full_backup_age", Str)
        .optional("max_megabytes_per_second", Integer)
        .constraint(Constraint::conflicting("included_backend_id", "excluded_backend_id"))
        .build()
}

fn delay() -> Result<Variant, RegistryError> {
    Variant::builder("delay")
        .optional("sleep_duration", Str)
        .optional("duration_to_wait_for_work_queue_idle", Str)
        .optional("ldap_url_for_search_expected_to_return_entries", Set)
        .optional("search_interval", Str)
        .optional("search_time_limit", Str)
        .optional("duration_to_wait_for_search_to_return_entries", Str)
        .optional_default("task_return_state_if_timeout_is_encountered", STOPPED_BY_ERROR)
        .constraint(Constraint::at_least_one_of(&[
            "sleep_duration",
            "duration_to_wait_for_work_queue_idle",
            "ldap_url_for_search_expected_to_return_entries",
        ]))
        .build()
}

fn statically_defined() -> Result<Variant, RegistryError> {
    Variant::builder("statically-defined")
        .required("task_java_class", Str)
        .required("task_object_class", Set)
        .optional("task_attribute_value", Set)
        .build()
}

fn collect_support_data() -> Result<Variant, RegistryError> {
    Variant::builder("collect-support-data")
        .required("output_directory", Str)
        .optional("encryption_passphrase_file", Str)
        .optional_default("include_expensive", false)
        .optional_default("include_replication_state_dump", false)
        .optional_default("include_binary_files", false)
        .optional_default("include_extension_source", false)
        .optional_default("use_sequential_mode", false)
        .optional_default("security_level", "obscure-secrets")
        .optional_default("jstack_count", 10_i64)
        .optional_default("report_count", 10_i64)
        .optional_default("report_interval_seconds", 1_i64)
        .optional("log_duration", Str)
        .optional("log_file_head_collection_size_kb", Integer)
        .optional("log_file_tail_collection_size_kb", Integer)
        .optional("comment", Str)
        .optional("retain_previous_support_data_archive_count", Integer)
        .optional("retain_previous_support_data_archive_age", Str)
        .build()
}

fn ldif_export() -> Result<Variant, RegistryError> {
    Variant::builder("ldif-export")
        .optional_default("ldif_directory", "ldif")
        .optional("backend_id", Set)
        .optional("exclude_backend_id", Set)
        .optional_default("compress", true)
        .optional_default("encrypt", false)
        .optional("encryption_settings_definition_id", Str)
        .optional_default("sign", false)
        .optional("retain_previous_ldif_export_count", Integer)
        .optional("retain_previous_ldif_export_age", Str)
        .optional("max_megabytes_per_second", Integer)
        .constraint(Constraint::conflicting("backend_id", "exclude_backend_id"))
        .build()
}

fn audit_data_security() -> Result<Variant, RegistryError> {
    Variant::builder("audit-data-security")
        .optional_default("base_output_directory", "reports/data-security-audits")
        .optional("data_security_auditor", Set)
        .optional("backend", Set)
        .optional("include_filter", Set)
        .optional("retain_previous_report_count", Integer)
        .optional("retain_previous_report_age", Str)
        .build()
}

fn exec() -> Result<Variant, RegistryError> {
    Variant::builder("exec")
        .required("command_path", Str)
        .optional("command_arguments", Str)
        .optional("command_output_file_base_name", Str)
        .optional("retain_previous_output_file_count", Integer)
        .optional("retain_previous_output_file_age", Str)
        .optional_default("log_command_output", false)
        .optional_default("task_completion_state_for_nonzero_exit_code", STOPPED_BY_ERROR)
        .optional("working_directory", Str)
        .build()
}

fn file_retention() -> Result<Variant, RegistryError> {
    Variant::builder("file-retention")
        .required("target_directory", Str)
        .required("filename_pattern", Str)
        .required("timestamp_format", Str)
        .optional("retain_file_count", Integer)
        .optional("retain_file_age", Str)
        .optional("retain_aggregate_file_size", Str)
        .constraint(Constraint::at_least_one_of(&[
            "retain_file_count",
            "retain_file_age",
            "retain_aggregate_file_size",
        ]))
        .build()
}

fn third_party() -> Result<Variant, RegistryError> {
    Variant::builder("third-party")
        .required("extension_class", Str)
        .optional("extension_argument", Set)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtask_record::FieldValue;

    #[test]
    fn catalog_builds() {
        let registry = recurring_tasks().unwrap();
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn catalog_names() {
        let registry = recurring_tasks().unwrap();
        for name in [
            "generate-server-profile",
            "leave-lockdown-mode",
            "backup",
            "delay",
            "statically-defined",
            "collect-support-data",
            "ldif-export",
            "enter-lockdown-mode",
            "audit-data-security",
            "exec",
            "file-retention",
            "third-party",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn compress_default_is_variant_scoped() {
        let registry = recurring_tasks().unwrap();
        let backup = registry.lookup("backup").unwrap();
        let export = registry.lookup("ldif-export").unwrap();

        assert_eq!(backup.default_for("compress"), Some(&FieldValue::Bool(false)));
        assert_eq!(export.default_for("compress"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn backup_has_no_required_fields() {
        let registry = recurring_tasks().unwrap();
        assert_eq!(registry.lookup("backup").unwrap().required_fields().count(), 0);
    }

    #[test]
    fn file_retention_requirements() {
        let registry = recurring_tasks().unwrap();
        let variant = registry.lookup("file-retention").unwrap();
        let required: Vec<_> = variant.required_fields().map(|f| f.as_str()).collect();
        assert_eq!(required, vec!["target_directory", "filename_pattern", "timestamp_format"]);
    }

    #[test]
    fn support_data_security_level_default() {
        let registry = recurring_tasks().unwrap();
        let variant = registry.lookup("collect-support-data").unwrap();
        assert_eq!(
            variant.default_for("security_level"),
            Some(&FieldValue::from("obscure-secrets"))
        );
    }

    #[test]
    fn lockdown_reason_owned_by_both_lockdown_variants() {
        let registry = recurring_tasks().unwrap();
        let owners: Vec<&str> = registry
            .iter()
            .filter(|v| v.kind_of("reason").is_some())
            .map(Variant::name)
            .collect();
        assert_eq!(owners, vec!["leave-lockdown-mode", "enter-lockdown-mode"]);
    }
}
