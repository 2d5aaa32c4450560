use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tagged wire value: exactly one variant per instance. The consuming
/// application only ever persists strings, integers, timestamps, nulls and
/// nested maps, so the remaining Firestore value kinds are not modeled;
/// decoding tolerates them (see [`WireValue::from_raw`]).
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    StringValue(String),
    /// String-encoded decimal, to avoid precision loss.
    IntegerValue(String),
    /// RFC3339.
    TimestampValue(String),
    NullValue(()),
    MapValue(MapValue),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
}

const VALUE_TAGS: [&str; 5] = [
    "stringValue",
    "integerValue",
    "timestampValue",
    "nullValue",
    "mapValue",
];

impl WireValue {
    /// Decodes a raw JSON value, degrading to `nullValue` instead of failing
    /// when the tag is unrecognized, missing or duplicated. A partially-known
    /// wire schema must not fail the whole document read.
    fn from_raw(raw: serde_json::Value) -> Self {
        let object = match raw {
            serde_json::Value::Object(object) => object,
            other => {
                warn!(?other, "wire value is not a JSON object, decoding as null");
                return WireValue::NullValue(());
            }
        };

        let tags: Vec<&str> = VALUE_TAGS
            .iter()
            .copied()
            .filter(|tag| object.contains_key(*tag))
            .collect();

        let tag = match tags.as_slice() {
            [tag] => *tag,
            _ => {
                warn!(
                    recognized = tags.len(),
                    "wire value with zero or multiple recognized tags, decoding as null"
                );
                return WireValue::NullValue(());
            }
        };

        let inner = object.get(tag).cloned().unwrap_or(serde_json::Value::Null);
        match tag {
            "stringValue" => match inner.as_str() {
                Some(s) => WireValue::StringValue(s.to_string()),
                None => WireValue::NullValue(()),
            },
            "integerValue" => match inner {
                // Always a string on the wire, but tolerate a bare number.
                serde_json::Value::String(s) => WireValue::IntegerValue(s),
                serde_json::Value::Number(n) => WireValue::IntegerValue(n.to_string()),
                _ => WireValue::NullValue(()),
            },
            "timestampValue" => match inner.as_str() {
                Some(s) => WireValue::TimestampValue(s.to_string()),
                None => WireValue::NullValue(()),
            },
            "mapValue" => match serde_json::from_value::<MapValue>(inner) {
                Ok(map) => WireValue::MapValue(map),
                Err(err) => {
                    warn!(error = %err, "undecodable mapValue, decoding as null");
                    WireValue::NullValue(())
                }
            },
            _ => WireValue::NullValue(()),
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(WireValue::from_raw(raw))
    }
}

/// A document as it travels on the wire: fully-qualified resource name plus
/// tagged field values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

// --- structured queries ---

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec<CollectionSelector>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<QueryFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub enum QueryFilter {
    FieldFilter(FieldFilter),
    CompositeFilter(CompositeFilter),
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOperator,
    pub value: WireValue,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    pub op: CompositeOperator,
    pub filters: Vec<QueryFilter>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOperator {
    And,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

/// Equality/ordering comparators, the only filter set the consuming
/// application needs.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOperator {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: Direction,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

/// One row of a query response. Rows without a `document` carry read-time or
/// skipped-results bookkeeping and are dropped.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub read_time: Option<String>,
}

// --- atomic commits ---

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
    #[serde(flatten)]
    pub operation: WriteOperation,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub enum WriteOperation {
    /// Upsert: creates the document if absent, replaces the named fields if
    /// present.
    Update(Document),
    /// Deletes the document at the given resource name.
    Delete(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub write_results: Vec<WriteResult>,
    #[serde(default)]
    pub commit_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    #[serde(default)]
    pub update_time: Option<String>,
}
