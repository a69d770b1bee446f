//! Snapshot types produced by the allocation engine.
//!
//! These mirror the upstream JSON wire format (camelCase field names) so a
//! snapshot can be loaded, resolved, and re-projected without translation.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The distinguished "no payload" value returned whenever nothing resolves.
pub static EMPTY_PAYLOAD: Payload = Payload { value: None };

/// Immutable bundle of buckets, allocations, and definitions for every test
/// evaluated at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorResult {
    pub matrix_version: String,
    #[serde(default)]
    pub buckets: BTreeMap<String, TestBucket>,
    #[serde(default)]
    pub allocations: BTreeMap<String, Allocation>,
    #[serde(default)]
    pub test_definitions: BTreeMap<String, TestDefinition>,
}

impl ProctorResult {
    pub fn new(
        matrix_version: impl Into<String>,
        buckets: BTreeMap<String, TestBucket>,
        allocations: BTreeMap<String, Allocation>,
        test_definitions: BTreeMap<String, TestDefinition>,
    ) -> Self {
        Self {
            matrix_version: matrix_version.into(),
            buckets,
            allocations,
            test_definitions,
        }
    }

    /// A snapshot with no evaluated tests.
    pub fn empty(matrix_version: impl Into<String>) -> Self {
        Self {
            matrix_version: matrix_version.into(),
            ..Self::default()
        }
    }
}

/// A named variant of a test. `value` is the selector; the other fields are
/// only meaningful when the bucket comes from a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestBucket {
    pub name: String,
    pub value: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Payload::is_empty")]
    pub payload: Payload,
}

impl TestBucket {
    pub fn new(name: impl Into<String>, value: i32, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            description: description.into(),
            payload: Payload::default(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// How a user was routed to a bucket. Ranges are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default)]
    pub ranges: Vec<Range>,
}

impl Allocation {
    pub fn new(id: impl Into<String>, ranges: Vec<Range>) -> Self {
        Self {
            id: id.into(),
            rule: None,
            ranges,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub bucket_value: i32,
    pub length: f64,
}

impl Range {
    pub fn new(bucket_value: i32, length: f64) -> Self {
        Self {
            bucket_value,
            length,
        }
    }
}

/// Catalogue of the legal buckets of one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub buckets: Vec<TestBucket>,
    /// Silent tests are evaluated but kept out of filtered logging output.
    #[serde(default)]
    pub silent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestDefinition {
    pub fn with_buckets(buckets: Vec<TestBucket>) -> Self {
        Self {
            buckets,
            ..Self::default()
        }
    }

    pub fn bucket_with_value(&self, value: i32) -> Option<&TestBucket> {
        self.buckets.iter().find(|bucket| bucket.value == value)
    }

    pub fn min_value(&self) -> Option<i32> {
        self.buckets.iter().map(|bucket| bucket.value).min()
    }
}

/// Opaque per-bucket data. The empty payload is distinct from every
/// non-empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    value: Option<PayloadValue>,
}

/// The single typed value a payload may hold. Serialized with the upstream
/// keys (`stringValue`, `longArray`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadValue {
    DoubleValue(f64),
    DoubleArray(Vec<f64>),
    LongValue(i64),
    LongArray(Vec<i64>),
    StringValue(String),
    StringArray(Vec<String>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl Payload {
    pub fn new(value: PayloadValue) -> Self {
        Self { value: Some(value) }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(PayloadValue::StringValue(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&PayloadValue> {
        self.value.as_ref()
    }

    /// The underlying content as plain JSON, for client-side config export.
    pub fn fetch_value(&self) -> Option<serde_json::Value> {
        let value = match self.value.as_ref()? {
            PayloadValue::DoubleValue(v) => serde_json::Value::from(*v),
            PayloadValue::DoubleArray(v) => serde_json::Value::from(v.clone()),
            PayloadValue::LongValue(v) => serde_json::Value::from(*v),
            PayloadValue::LongArray(v) => serde_json::Value::from(v.clone()),
            PayloadValue::StringValue(v) => serde_json::Value::from(v.as_str()),
            PayloadValue::StringArray(v) => serde_json::Value::from(v.clone()),
            PayloadValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_upstream_keys() {
        let bucket = TestBucket::new("control", 0, "control").with_payload(Payload::string("x"));
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["payload"]["stringValue"], "x");

        let parsed: TestBucket = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, bucket);
    }

    #[test]
    fn empty_payload_is_omitted_and_defaulted() {
        let bucket = TestBucket::new("inactive", -1, "inactive");
        let json = serde_json::to_value(&bucket).unwrap();
        assert!(json.get("payload").is_none());

        let parsed: TestBucket =
            serde_json::from_str(r#"{"name":"inactive","value":-1}"#).unwrap();
        assert_eq!(parsed.payload, EMPTY_PAYLOAD);
        assert_eq!(parsed.description, "");
    }

    #[test]
    fn fetch_value_unwraps_content() {
        assert_eq!(EMPTY_PAYLOAD.fetch_value(), None);
        assert_eq!(
            Payload::new(PayloadValue::LongArray(vec![1, 2])).fetch_value(),
            Some(serde_json::json!([1, 2]))
        );
        let mut map = BTreeMap::new();
        map.insert("color".to_string(), serde_json::json!("blue"));
        assert_eq!(
            Payload::new(PayloadValue::Map(map)).fetch_value(),
            Some(serde_json::json!({"color": "blue"}))
        );
    }

    #[test]
    fn snapshot_reads_camel_case_fields() {
        let result: ProctorResult = serde_json::from_str(
            r##"{
                "matrixVersion": "7",
                "buckets": {"bgtst": {"name": "control", "value": 0}},
                "allocations": {"bgtst": {"id": "#A1", "ranges": [{"bucketValue": 0, "length": 1.0}]}}
            }"##,
        )
        .unwrap();
        assert_eq!(result.matrix_version, "7");
        assert_eq!(result.buckets["bgtst"].value, 0);
        assert_eq!(result.allocations["bgtst"].ranges[0].bucket_value, 0);
        assert!(result.test_definitions.is_empty());
    }
}
