//! Decoding records from JSON objects
//!
//! Field values carry no kind information in JSON (a list and a set look the
//! same), so decoding resolves each field's kind through the registry.

use crate::registry::{RegistryError, VariantRegistry};
use rtask_record::{FieldName, FieldValue, RecordError, TaskRecord, ValueError, DISCRIMINATOR};
use serde_json::{Map, Value as JsonValue};

/// Key convention of the object being decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// Caller-authored record: snake_case keys, discriminator under `type`,
    /// unknown keys rejected
    Snake,

    /// Server representation: kebab-case keys, variant resolved from the
    /// `schemas` array, unknown and reserved keys skipped
    Kebab,
}

/// Keys of the server representation that never hold task fields
const RESERVED_WIRE_KEYS: [&str; 3] = ["id", "schemas", "meta"];

/// Decode a record from a JSON object
///
/// `null` values decode as absent fields.
///
/// # Errors
/// Returns error if the discriminator cannot be resolved, a snake_case key
/// names a field no variant declares, or a value does not fit its kind
pub fn decode_record(
    object: &Map<String, JsonValue>,
    registry: &VariantRegistry,
    style: KeyStyle,
) -> Result<TaskRecord, DecodeError> {
    let variant = match style {
        KeyStyle::Snake => {
            let task_type = object
                .get(DISCRIMINATOR)
                .and_then(JsonValue::as_str)
                .ok_or(DecodeError::MissingDiscriminator)?;
            registry.lookup(task_type)?
        }
        KeyStyle::Kebab => object
            .get("schemas")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
            .filter_map(JsonValue::as_str)
            .find_map(|urn| registry.variant_for_schema(urn))
            .ok_or(DecodeError::MissingDiscriminator)?,
    };

    let mut record = TaskRecord::new(variant.name())?;
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let field = match style {
            KeyStyle::Snake => {
                if key == DISCRIMINATOR {
                    continue;
                }
                FieldName::new(key.as_str()).map_err(|_| DecodeError::UnknownField(key.clone()))?
            }
            KeyStyle::Kebab => {
                if RESERVED_WIRE_KEYS.contains(&key.as_str()) || key.starts_with("urn:") {
                    continue;
                }
                match FieldName::from_wire(key) {
                    Ok(field) if registry.field_kind(field.as_str()).is_some() => field,
                    _ => {
                        tracing::debug!(key = %key, variant = variant.name(), "skipping unrecognized attribute");
                        continue;
                    }
                }
            }
        };

        let kind = variant
            .kind_of(field.as_str())
            .or_else(|| registry.field_kind(field.as_str()))
            .ok_or_else(|| DecodeError::UnknownField(key.clone()))?;
        let value = FieldValue::from_json(kind, value).map_err(|source| DecodeError::Value {
            field: field.to_string(),
            source,
        })?;
        record.insert(field, value)?;
    }
    Ok(record)
}

/// Errors decoding records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No usable discriminator
    #[error("record has no recognizable task type")]
    MissingDiscriminator,

    /// Key does not name a field of any variant
    #[error("unknown field: '{0}'")]
    UnknownField(String),

    /// Value does not fit the field kind
    #[error("invalid value for '{field}': {source}")]
    Value {
        field: String,
        #[source]
        source: ValueError,
    },

    /// Discriminator not registered
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Record construction failed
    #[error(transparent)]
    Record(#[from] RecordError),
}
