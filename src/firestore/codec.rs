//! Bidirectional mapping between native field values and the tagged wire
//! representation.
//!
//! Two deliberate narrowings are load-bearing for data already persisted by
//! the consuming application and must not be "fixed":
//!
//! - fractional numbers encode as integers truncated toward zero;
//! - `integerValue` decodes to its wire *string*, never parsed back to a
//!   number, so precision is preserved end to end.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use super::models::{MapValue, WireValue};

/// A native field value as the consuming application sees it.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    /// Encoded by truncation toward zero into `integerValue`; the source
    /// system never persists fractional values.
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Map(DocumentFields),
}

/// A plain document body: field name to native value.
pub type DocumentFields = BTreeMap<String, FieldValue>;

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<DocumentFields> for FieldValue {
    fn from(value: DocumentFields) -> Self {
        FieldValue::Map(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Encodes a native value into its tagged wire form. Never fails: values the
/// wire format cannot carry exactly fall back to their string representation.
pub fn encode_value(value: &FieldValue) -> WireValue {
    match value {
        FieldValue::Null => WireValue::NullValue(()),
        FieldValue::Integer(i) => WireValue::IntegerValue(i.to_string()),
        FieldValue::Double(d) if d.is_finite() => {
            WireValue::IntegerValue((d.trunc() as i64).to_string())
        }
        // Last-resort fallback for NaN and infinities.
        FieldValue::Double(d) => WireValue::StringValue(d.to_string()),
        FieldValue::Timestamp(t) => {
            WireValue::TimestampValue(t.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        FieldValue::String(s) => WireValue::StringValue(s.clone()),
        FieldValue::Map(fields) => WireValue::MapValue(MapValue {
            fields: encode_fields(fields),
        }),
    }
}

/// Decodes a tagged wire value. Unrecognized tags were already degraded to
/// `nullValue` at deserialization time, so this is total.
pub fn decode_value(value: &WireValue) -> FieldValue {
    match value {
        WireValue::StringValue(s) => FieldValue::String(s.clone()),
        WireValue::IntegerValue(s) => FieldValue::String(s.clone()),
        WireValue::TimestampValue(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(t) => FieldValue::Timestamp(t.with_timezone(&Utc)),
            Err(err) => {
                warn!(raw = %s, error = %err, "unparseable timestampValue, decoding as null");
                FieldValue::Null
            }
        },
        WireValue::NullValue(()) => FieldValue::Null,
        WireValue::MapValue(map) => FieldValue::Map(decode_fields(&map.fields)),
    }
}

pub fn encode_fields(fields: &DocumentFields) -> BTreeMap<String, WireValue> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

pub fn decode_fields(fields: &BTreeMap<String, WireValue>) -> DocumentFields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}
