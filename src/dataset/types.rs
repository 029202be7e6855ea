//! Dataset record types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::sanctions::extract::{extract_addresses, extract_metadata, RecordShape};

/// A watchlisted actor, normalized from any of the supported record layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanctionEntity {
    /// Lowercase addresses this record is about (empty if none could be extracted)
    pub addresses: BTreeSet<String>,
    /// Layouts the addresses came from, in strategy order
    pub shapes: Vec<RecordShape>,
    pub label: Option<String>,
    pub jurisdiction: Option<String>,
    pub reason: Option<String>,
    pub source: Option<String>,
    /// Provenance tag: the file this record was loaded from
    pub source_file: String,
}

impl SanctionEntity {
    /// Normalize a raw map-shaped record
    pub fn from_record(record: &Map<String, Value>, source_file: &str) -> Self {
        let (shapes, addresses) = extract_addresses(record).unwrap_or_default();
        let meta = extract_metadata(record);

        Self {
            addresses,
            shapes,
            label: meta.label,
            jurisdiction: meta.jurisdiction,
            reason: meta.reason,
            source: meta.source,
            source_file: source_file.to_string(),
        }
    }
}

/// Ordered sanctions records sharing one provenance tag
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub source_file: String,
    pub entities: Vec<SanctionEntity>,
}

impl Dataset {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            entities: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Records per layout in strategy order, plus the count of records with no address
    pub fn shape_breakdown(&self) -> (Vec<(RecordShape, usize)>, usize) {
        let per_shape = RecordShape::ORDER
            .iter()
            .map(|shape| {
                let count = self
                    .entities
                    .iter()
                    .filter(|e| e.shapes.contains(shape))
                    .count();
                (*shape, count)
            })
            .collect();
        let unaddressed = self.entities.iter().filter(|e| e.shapes.is_empty()).count();
        (per_shape, unaddressed)
    }
}

/// Severity rating of a malicious contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    /// Missing or unrecognized rating
    #[default]
    Unknown,
}

impl Severity {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Severity::parse).unwrap_or_default())
    }
}

/// Known harmful on-chain address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaliciousContract {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub jurisdictions_blocked: BTreeSet<String>,
}

/// Malicious contracts keyed by lowercase address
#[derive(Debug, Clone, Default)]
pub struct MaliciousRegistry {
    contracts: HashMap<String, MaliciousContract>,
}

impl MaliciousRegistry {
    /// Build the lookup; a later entry for the same address replaces an earlier one
    pub fn new(contracts: Vec<MaliciousContract>) -> Self {
        let contracts = contracts
            .into_iter()
            .map(|mut c| {
                c.address = c.address.trim().to_lowercase();
                (c.address.clone(), c)
            })
            .collect();
        Self { contracts }
    }

    pub fn get(&self, address: &str) -> Option<&MaliciousContract> {
        self.contracts.get(&address.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" critical "), Severity::Critical);
        assert_eq!(Severity::parse("severe"), Severity::Unknown);

        let c: MaliciousContract = serde_json::from_value(json!({
            "address": "0xAbC",
            "name": "Drainer",
            "severity": "Medium",
            "jurisdictions_blocked": ["US", "EU", "US"]
        }))
        .unwrap();
        assert_eq!(c.severity, Severity::Medium);
        assert_eq!(c.jurisdictions_blocked.len(), 2);
        assert_eq!(serde_json::to_value(c.severity).unwrap(), json!("medium"));
    }

    #[test]
    fn test_severity_missing_or_null() {
        let c: MaliciousContract =
            serde_json::from_value(json!({"address": "0x1", "severity": null})).unwrap();
        assert_eq!(c.severity, Severity::Unknown);
        assert_eq!(c.name, None);
    }

    #[test]
    fn test_registry_lowercases_keys() {
        let registry = MaliciousRegistry::new(vec![MaliciousContract {
            address: "0xABCDEF".to_string(),
            name: Some("Fake Airdrop".to_string()),
            severity: Severity::High,
            jurisdictions_blocked: BTreeSet::new(),
        }]);

        let hit = registry.get("0xAbCdEf").unwrap();
        assert_eq!(hit.address, "0xabcdef");
        assert!(registry.get("0x000000").is_none());
    }

    #[test]
    fn test_entity_addresses_are_lowercased() {
        let record = json!({"address": "0xAbC", "label": "Mixer"});
        let entity = SanctionEntity::from_record(record.as_object().unwrap(), "aux.json");
        assert!(entity.addresses.contains("0xabc"));
        assert_eq!(entity.shapes, vec![RecordShape::FlatAddress]);
        assert_eq!(entity.source_file, "aux.json");
    }

    #[test]
    fn test_shape_breakdown() {
        let mut dataset = Dataset::new("mixed.json");
        for record in [
            json!({"addresses": ["0x1"], "address": "0x2"}),
            json!({"properties": {"address": "0x3"}}),
            json!({"address": "0x4"}),
            json!({"label": "no address"}),
        ] {
            let entity = SanctionEntity::from_record(record.as_object().unwrap(), "mixed.json");
            dataset.entities.push(entity);
        }

        let (per_shape, unaddressed) = dataset.shape_breakdown();
        assert_eq!(
            per_shape,
            vec![
                (RecordShape::AddressList, 1),
                (RecordShape::NestedAddress, 1),
                (RecordShape::FlatAddress, 2),
            ]
        );
        assert_eq!(unaddressed, 1);
    }
}
