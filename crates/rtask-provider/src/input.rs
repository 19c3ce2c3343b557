//! Reading records from files
//!
//! Desired records are snake_case objects with a `type` key. Observed
//! records may also be server bodies (kebab-case keys with `schemas`).
//! Files ending in `.yaml` or `.yml` are YAML, anything else JSON.

use crate::wire::{self, WireError};
use rtask_record::TaskRecord;
use rtask_variant::{decode_record, DecodeError, KeyStyle, VariantRegistry};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Read a YAML or JSON document
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn read_document(path: &Path) -> Result<JsonValue, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| InputError::Parse(e.to_string()))
    } else {
        serde_json::from_str(&text).map_err(|e| InputError::Parse(e.to_string()))
    }
}

/// Decode a caller-authored record
///
/// # Errors
/// Returns error if the document is not an object or does not decode
pub fn desired_record(document: &JsonValue, registry: &VariantRegistry) -> Result<TaskRecord, InputError> {
    let object = document.as_object().ok_or(InputError::NotAnObject)?;
    Ok(decode_record(object, registry, KeyStyle::Snake)?)
}

/// Decode an observed record in either representation
///
/// # Errors
/// Returns error if the document is not an object or does not decode
pub fn observed_record(document: &JsonValue, registry: &VariantRegistry) -> Result<TaskRecord, InputError> {
    let object = document.as_object().ok_or(InputError::NotAnObject)?;
    if object.contains_key("schemas") {
        Ok(wire::parse_response(document, registry)?.record)
    } else {
        Ok(decode_record(object, registry, KeyStyle::Snake)?)
    }
}

/// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not valid YAML or JSON
    #[error("cannot parse document: {0}")]
    Parse(String),

    /// Top level is not a mapping
    #[error("document must be an object")]
    NotAnObject,

    /// Record does not decode
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Server body does not decode
    #[error(transparent)]
    Wire(#[from] WireError),
}
