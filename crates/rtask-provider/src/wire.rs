//! Conversion between task records and the configuration API's JSON
//!
//! Field names travel in kebab-case, the variant travels as its schema URN
//! in `schemas`, and server messages ride in a URN-keyed envelope.

use rtask_record::{FieldValue, PatchKind, PatchOperation, TaskRecord};
use rtask_variant::{decode_record, DecodeError, KeyStyle, Variant, VariantRegistry};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeSet;

/// Envelope key of server messages
pub const MESSAGES_URN: &str = "urn:pingidentity:schemas:configuration:messages:2.0";

/// Body of a create request
///
/// Fields are written in the variant's declaration order. Empty strings are
/// left out since the server treats them as unset.
#[must_use]
pub fn create_payload(id: &str, record: &TaskRecord, variant: &Variant) -> JsonValue {
    let mut body = Map::new();
    body.insert("id".to_string(), JsonValue::from(id));
    body.insert("schemas".to_string(), json!([variant.schema_urn()]));
    for (name, _) in variant.declared_fields() {
        match record.get(name.as_str()) {
            Some(value) if !value.is_empty_string() => {
                body.insert(name.wire_name(), value.to_json());
            }
            _ => {}
        }
    }
    JsonValue::Object(body)
}

/// Body of a patch request
///
/// A replace with an empty string clears the attribute, so it is sent as
/// a value-less remove.
#[must_use]
pub fn patch_payload(operations: &[PatchOperation]) -> JsonValue {
    let operations: Vec<JsonValue> = operations.iter().map(patch_operation).collect();
    json!({ "operations": operations })
}

fn patch_operation(operation: &PatchOperation) -> JsonValue {
    let path = operation.field().wire_name();
    match (operation.kind(), operation.value()) {
        (PatchKind::Replace, FieldValue::String(s)) if s.is_empty() => json!({ "op": "remove", "path": path }),
        (PatchKind::Replace, value) => json!({ "op": "replace", "path": path, "value": value.to_json() }),
        (PatchKind::AddValues, value) => json!({ "op": "add", "path": path, "value": value.to_json() }),
        (PatchKind::RemoveValues, value) => json!({ "op": "remove", "path": path, "value": value.to_json() }),
    }
}

/// Decoded server representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Object id, if the server echoed one
    pub id: Option<String>,
    /// Task record, not yet normalized
    pub record: TaskRecord,
    /// Informational messages
    pub notifications: BTreeSet<String>,
    /// Actions the operator must take (restarts and the like)
    pub required_actions: BTreeSet<String>,
}

/// Decode a server response
///
/// # Errors
/// Returns error if the body is not an object, names no known task schema,
/// or holds a value that does not fit its field's kind
pub fn parse_response(body: &JsonValue, registry: &VariantRegistry) -> Result<ParsedResponse, WireError> {
    let object = body.as_object().ok_or(WireError::NotAnObject)?;
    let record = decode_record(object, registry, KeyStyle::Kebab)?;
    let id = object.get("id").and_then(JsonValue::as_str).map(str::to_string);

    let (notifications, required_actions) = match object.get(MESSAGES_URN) {
        Some(JsonValue::Object(messages)) => (
            messages_of(messages, "notifications")?,
            messages_of(messages, "requiredActions")?,
        ),
        Some(JsonValue::Null) | None => (BTreeSet::new(), BTreeSet::new()),
        Some(_) => return Err(WireError::MalformedMessages("envelope is not an object".to_string())),
    };

    Ok(ParsedResponse {
        id,
        record,
        notifications,
        required_actions,
    })
}

/// Strings are kept as-is; structured entries are kept as compact JSON
fn messages_of(envelope: &Map<String, JsonValue>, key: &str) -> Result<BTreeSet<String>, WireError> {
    match envelope.get(key) {
        None | Some(JsonValue::Null) => Ok(BTreeSet::new()),
        Some(JsonValue::Array(entries)) => Ok(entries
            .iter()
            .map(|entry| match entry {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()),
        Some(_) => Err(WireError::MalformedMessages(format!("'{key}' is not an array"))),
    }
}

/// Wire conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Body is not a JSON object
    #[error("response body is not a JSON object")]
    NotAnObject,

    /// Message envelope has an unexpected shape
    #[error("malformed message envelope: {0}")]
    MalformedMessages(String),

    /// Task fields could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
