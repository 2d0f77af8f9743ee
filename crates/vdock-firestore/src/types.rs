//! Firestore REST API types.
//!
//! Wire shapes for the documents surface. Firestore tags every value
//! with its type (`{"stringValue": "..."}`), so the `Value` enum uses
//! externally tagged serde with camelCase variant names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, assigned by the server.
    pub name: Option<String>,
    pub fields: Option<HashMap<String, Value>>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document carrying the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::default()
        }
    }

    /// The document id, i.e. the last segment of the resource name.
    pub fn doc_id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }
}

/// Firestore document value types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// Integers travel as decimal strings on the wire.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// `values` is absent, not empty, when the array has no elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

/// Nested document, used for map fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

// ============================================================================
// Query Types
// ============================================================================

/// A structured query over a single collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: String,
}

/// Request body for the `:runQuery` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

/// One element of the `:runQuery` response array.
///
/// Elements without a `document` carry read times or partial progress and
/// are skipped by callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<Document>,
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Lift a Rust value into its tagged wire representation.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

/// Extract a Rust value from a tagged wire value. `None` on a tag mismatch.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_value_wire_shape() {
        let value = "hello".to_firestore_value();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({ "stringValue": "hello" }));
    }

    #[test]
    fn test_timestamp_value_round_trip() {
        let now = Utc::now();
        let value = now.to_firestore_value();
        let back = DateTime::<Utc>::from_firestore_value(&value).unwrap();
        assert_eq!(back, now);
    }

    #[test]
    fn test_none_serializes_as_null_value() {
        let value: Value = Option::<String>::None.to_firestore_value();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({ "nullValue": null }));
    }

    #[test]
    fn test_doc_id_from_resource_name() {
        let doc = Document {
            name: Some(
                "projects/p/databases/(default)/documents/videos/abc123".to_string(),
            ),
            ..Document::default()
        };
        assert_eq!(doc.doc_id(), Some("abc123"));
    }

    #[test]
    fn test_query_wire_shape_skips_unset_fields() {
        let query = StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: "videos".to_string(),
                all_descendants: None,
            }],
            r#where: None,
            order_by: None,
            limit: None,
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "from": [{ "collectionId": "videos" }] })
        );
    }

    #[test]
    fn test_field_filter_wire_shape() {
        let query = StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: "videos".to_string(),
                all_descendants: None,
            }],
            r#where: Some(Filter {
                field_filter: Some(FieldFilter {
                    field: FieldReference {
                        field_path: "user_id".to_string(),
                    },
                    op: "EQUAL".to_string(),
                    value: Value::StringValue("u1".to_string()),
                }),
            }),
            order_by: None,
            limit: None,
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["where"]["fieldFilter"]["field"]["fieldPath"],
            "user_id"
        );
        assert_eq!(json["where"]["fieldFilter"]["op"], "EQUAL");
    }

    #[test]
    fn test_run_query_response_without_document() {
        let raw = r#"[{"readTime": "2024-01-01T00:00:00Z"}, {"document": {"name": "projects/p/databases/(default)/documents/videos/v1"}}]"#;
        let responses: Vec<RunQueryResponse> = serde_json::from_str(raw).unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].document.is_none());
        assert!(responses[1].document.is_some());
    }
}
