//! Address and metadata extraction from heterogeneous dataset records
//!
//! Sanctions datasets encode "the address this record is about" in one of
//! three ways. Each [`RecordShape`] is an extraction strategy. Every strategy
//! is tried in [`RecordShape::ORDER`] and the addresses of all that yield are
//! merged, so a record carrying both a list and a flat field is matched on both.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Record layout an address was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    /// `{"addresses": ["0x..", ..], "label": .., ..}`
    AddressList,
    /// `{"properties": {"address": "0x.." | ["0x..", ..], "name": ..}}`
    NestedAddress,
    /// `{"address": "0x..", ..}`
    FlatAddress,
}

impl RecordShape {
    /// Strategy evaluation order
    pub const ORDER: [RecordShape; 3] = [
        RecordShape::AddressList,
        RecordShape::NestedAddress,
        RecordShape::FlatAddress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordShape::AddressList => "address_list",
            RecordShape::NestedAddress => "nested_address",
            RecordShape::FlatAddress => "flat_address",
        }
    }

    /// Try this strategy against a record.
    ///
    /// Returns `None` when the record does not expose this shape or the
    /// field holds no usable address strings.
    pub fn extract(self, record: &Map<String, Value>) -> Option<BTreeSet<String>> {
        let field = match self {
            RecordShape::AddressList => record.get("addresses").filter(|v| v.is_array()),
            RecordShape::NestedAddress => record
                .get("properties")
                .and_then(Value::as_object)
                .and_then(|props| props.get("address")),
            RecordShape::FlatAddress => record.get("address").filter(|v| v.is_string()),
        }?;

        let addresses: BTreeSet<String> = string_values(field)
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        if addresses.is_empty() {
            None
        } else {
            Some(addresses)
        }
    }
}

/// Run the strategy chain, returning the shapes that yielded and the merged addresses
pub fn extract_addresses(
    record: &Map<String, Value>,
) -> Option<(Vec<RecordShape>, BTreeSet<String>)> {
    let mut shapes = Vec::new();
    let mut addresses = BTreeSet::new();

    for shape in RecordShape::ORDER {
        if let Some(found) = shape.extract(record) {
            shapes.push(shape);
            addresses.extend(found);
        }
    }

    if shapes.is_empty() {
        None
    } else {
        Some((shapes, addresses))
    }
}

/// Descriptive fields of a record, resolved across layouts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMetadata {
    pub label: Option<String>,
    pub jurisdiction: Option<String>,
    pub reason: Option<String>,
    pub source: Option<String>,
}

/// Resolve descriptive fields, preferring top-level keys over `properties`
pub fn extract_metadata(record: &Map<String, Value>) -> RecordMetadata {
    RecordMetadata {
        label: first_text(record, &["label"])
            .or_else(|| property_text(record, "name"))
            .or_else(|| first_text(record, &["name"])),
        jurisdiction: first_text(record, &["jurisdiction"])
            .or_else(|| property_text(record, "country")),
        reason: first_text(record, &["reason"]).or_else(|| property_text(record, "reason")),
        source: first_text(record, &["source"]).or_else(|| property_text(record, "source")),
    }
}

fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find_map(|v| string_values(v).find(|s| !s.trim().is_empty()))
        .map(|s| s.trim().to_string())
}

fn property_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| first_text(props, &[key]))
}

/// A string value, or the string elements of an array value
fn string_values(value: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match value {
        Value::String(s) => Box::new(std::iter::once(s.as_str())),
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_str)),
        _ => Box::new(std::iter::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_address_list_shape() {
        let record = obj(json!({
            "addresses": ["0xAAA0000000000000000000000000000000000001", "0xbbb", 7],
            "label": "Lazarus Group"
        }));

        let (shapes, addrs) = extract_addresses(&record).unwrap();
        assert_eq!(shapes, vec![RecordShape::AddressList]);
        assert!(addrs.contains("0xaaa0000000000000000000000000000000000001"));
        assert!(addrs.contains("0xbbb"));
        assert_eq!(addrs.len(), 2);
    }

    #[test]
    fn test_nested_shape_string_and_list() {
        let single = obj(json!({"properties": {"address": "0xABC", "name": ["Garantex"]}}));
        let (shapes, addrs) = extract_addresses(&single).unwrap();
        assert_eq!(shapes, vec![RecordShape::NestedAddress]);
        assert!(addrs.contains("0xabc"));

        let many = obj(json!({"properties": {"address": ["0x1", "0x2"]}}));
        let (_, addrs) = extract_addresses(&many).unwrap();
        assert_eq!(addrs.len(), 2);
    }

    #[test]
    fn test_flat_shape() {
        let record = obj(json!({"address": "0xDeAd", "label": "Burn"}));
        let (shapes, addrs) = extract_addresses(&record).unwrap();
        assert_eq!(shapes, vec![RecordShape::FlatAddress]);
        assert!(addrs.contains("0xdead"));
    }

    #[test]
    fn test_strategies_decline() {
        // empty list declines and falls through to the flat field
        let record = obj(json!({"addresses": [], "address": "0x9"}));
        let (shapes, _) = extract_addresses(&record).unwrap();
        assert_eq!(shapes, vec![RecordShape::FlatAddress]);

        assert!(extract_addresses(&obj(json!({"name": "no address"}))).is_none());
        assert!(extract_addresses(&obj(json!({"address": 12}))).is_none());
    }

    #[test]
    fn test_every_yielding_shape_contributes() {
        let record = obj(json!({
            "addresses": ["0xAAA1"],
            "address": "0xAAA2",
            "properties": {"address": ["0xaaa3", "0xAAA1"]}
        }));

        let (shapes, addrs) = extract_addresses(&record).unwrap();
        assert_eq!(shapes, RecordShape::ORDER.to_vec());
        let expected: BTreeSet<String> = ["0xaaa1", "0xaaa2", "0xaaa3"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(addrs, expected);
    }

    #[test]
    fn test_metadata_resolution() {
        let flat = obj(json!({
            "address": "0x1",
            "label": "Israel NBCTF",
            "jurisdiction": "IL",
            "reason": "Sanctions Order 1"
        }));
        let meta = extract_metadata(&flat);
        assert_eq!(meta.label.as_deref(), Some("Israel NBCTF"));
        assert_eq!(meta.jurisdiction.as_deref(), Some("IL"));
        assert_eq!(meta.reason.as_deref(), Some("Sanctions Order 1"));

        let ftm = obj(json!({
            "properties": {"address": ["0x2"], "name": ["Tornado Cash"], "country": ["us"]}
        }));
        let meta = extract_metadata(&ftm);
        assert_eq!(meta.label.as_deref(), Some("Tornado Cash"));
        assert_eq!(meta.jurisdiction.as_deref(), Some("us"));
        assert_eq!(meta.reason, None);
    }
}
