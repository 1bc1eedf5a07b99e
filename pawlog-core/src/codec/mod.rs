//! Entity codec: the only place that converts between local and wire records.
//!
//! Local records are the entity structs serialized with camelCase names and
//! native chrono values. Wire records use snake_case names, RFC 3339
//! timestamps and JSON-encoded strings for nested values. Each entity declares
//! a field table (see [`Field`]); keys that are not in the table pass through
//! untouched in both directions, except the server-managed keys, which never
//! enter a local record or leave with one.

mod error;
pub mod field;

pub use error::CodecError;
pub use field::{camel_to_snake, snake_to_camel, Field, FieldKind};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::models::Entity;

/// A record in the remote store's shape.
pub type WireRecord = Map<String, Value>;

/// Field name reported when a whole record fails to (de)serialize.
pub const RECORD_FIELD: &str = "<record>";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire keys owned by the server. Dropped by both conversions.
pub const SERVER_MANAGED_KEYS: &[&str] = &["server_updated_at"];

fn is_server_managed(key: &str) -> bool {
    SERVER_MANAGED_KEYS.contains(&key)
}

/// Converts a local entity into its wire shape.
pub fn to_wire<T: Entity>(entity: &T) -> Result<WireRecord, CodecError> {
    let local = match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(CodecError::encoding(
                RECORD_FIELD,
                format!("expected an object, got {}", json_type(&other)),
            ))
        }
        Err(e) => return Err(CodecError::encoding(RECORD_FIELD, e)),
    };

    let mut wire = WireRecord::new();
    for (key, value) in local {
        match field::by_local(T::FIELDS, &key) {
            Some(f) => {
                let value = encode_value(f, value)?;
                wire.insert(f.wire_name(), value);
            }
            None if is_server_managed(&key) => {}
            None => {
                wire.insert(key, value);
            }
        }
    }
    Ok(wire)
}

/// Converts a wire record back into a local entity.
pub fn from_wire<T: Entity>(wire: WireRecord) -> Result<T, CodecError> {
    let mut local = Map::new();
    for (key, value) in wire {
        match field::by_wire(T::FIELDS, &key) {
            Some(f) => {
                let value = decode_value(f, &key, value)?;
                local.insert(f.local.to_string(), value);
            }
            None if is_server_managed(&key) => {}
            None => {
                local.insert(key, value);
            }
        }
    }
    serde_json::from_value(Value::Object(local)).map_err(|e| CodecError::decoding(RECORD_FIELD, e))
}

/// Returns the `id` of a wire record, if it has a string one.
pub fn wire_id(record: &WireRecord) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Formats a timestamp the way it travels on the wire.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp with an offset.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn encode_value(field: &Field, value: Value) -> Result<Value, CodecError> {
    match (field.kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Plain, v) | (FieldKind::Date, v) => Ok(v),
        (FieldKind::Timestamp, Value::String(s)) => parse_timestamp(&s)
            .map(|ts| Value::String(format_timestamp(&ts)))
            .ok_or_else(|| CodecError::encoding(field.local, format!("not a timestamp: {s}"))),
        (FieldKind::Timestamp, other) => Err(CodecError::encoding(
            field.local,
            format!("expected a timestamp string, got {}", json_type(&other)),
        )),
        (FieldKind::Json, v) => serde_json::to_string(&v)
            .map(Value::String)
            .map_err(|e| CodecError::encoding(field.local, e)),
    }
}

fn decode_value(field: &Field, wire_name: &str, value: Value) -> Result<Value, CodecError> {
    let malformed = |value: String| CodecError::MalformedTimestamp {
        field: wire_name.to_string(),
        value,
    };

    match (field.kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Plain, v) => Ok(v),
        (FieldKind::Timestamp, Value::String(s)) => match parse_timestamp(&s) {
            Some(ts) => serde_json::to_value(ts).map_err(|e| CodecError::decoding(wire_name, e)),
            None => Err(malformed(s)),
        },
        (FieldKind::Date, Value::String(s)) => match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
            Ok(date) => Ok(Value::String(date.format(DATE_FORMAT).to_string())),
            Err(_) => Err(malformed(s)),
        },
        (FieldKind::Timestamp | FieldKind::Date, other) => Err(malformed(other.to_string())),
        (FieldKind::Json, Value::String(s)) => {
            serde_json::from_str(&s).map_err(|e| CodecError::decoding(wire_name, e))
        }
        // Some backends hand nested columns back already parsed.
        (FieldKind::Json, v @ (Value::Array(_) | Value::Object(_))) => Ok(v),
        (FieldKind::Json, other) => Err(CodecError::decoding(
            wire_name,
            format!("expected a JSON-encoded string, got {}", json_type(&other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
