//! Sanctions matching across every loaded dataset

use serde::Serialize;
use tracing::warn;

use crate::dataset::{Dataset, SanctionEntity};

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";

/// Uniform view of a sanctions hit for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanctionSummary {
    pub label: String,
    pub jurisdiction: String,
    pub reason: String,
    pub source_file: String,
}

/// Tests addresses against sanctions datasets
#[derive(Debug, Clone, Copy, Default)]
pub struct SanctionsMatcher;

impl SanctionsMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Every record, in every dataset, that lists `address`
    pub fn match_address<'a, I>(&self, address: &str, datasets: I) -> Vec<&'a SanctionEntity>
    where
        I: IntoIterator<Item = &'a Dataset>,
    {
        let needle = address.trim().to_lowercase();

        let hits: Vec<&SanctionEntity> = datasets
            .into_iter()
            .flat_map(|dataset| dataset.entities.iter())
            .filter(|entity| entity.addresses.contains(&needle))
            .collect();

        if !hits.is_empty() {
            warn!(
                "SANCTIONS ALERT: {} matched {} record(s) in [{}]",
                address,
                hits.len(),
                hits.iter()
                    .map(|h| h.source_file.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        hits
    }

    /// Normalize hits to one shape, filling gaps with "Unknown"/"N/A"
    pub fn summarize(&self, hits: &[&SanctionEntity]) -> Vec<SanctionSummary> {
        hits.iter()
            .map(|entity| SanctionSummary {
                label: entity.label.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                jurisdiction: entity
                    .jurisdiction
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                reason: entity
                    .reason
                    .clone()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                source_file: entity.source_file.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const TARGET: &str = "0x910Cbd523D972eb0a6f4cAe4618aD62622b39DbF";

    fn dataset(source: &str, records: Vec<Value>) -> Dataset {
        Dataset {
            source_file: source.to_string(),
            entities: records
                .iter()
                .map(|r| SanctionEntity::from_record(r.as_object().unwrap(), source))
                .collect(),
        }
    }

    #[test]
    fn test_hits_from_every_dataset_surface() {
        let core = dataset(
            "entities.ftm.json",
            vec![json!({
                "addresses": [TARGET.to_lowercase()],
                "label": "Tornado Cash",
                "jurisdiction": "US",
                "reason": "OFAC SDN"
            })],
        );
        let aux = dataset(
            "normalized_uniswap_trm.json",
            vec![
                json!({"address": "0x0000000000000000000000000000000000000001"}),
                json!({"address": TARGET.to_uppercase().replace("0X", "0x"), "name": "Mixer"}),
            ],
        );

        let matcher = SanctionsMatcher::new();
        let hits = matcher.match_address(TARGET, [&core, &aux]);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source_file, "entities.ftm.json");
        assert_eq!(hits[1].source_file, "normalized_uniswap_trm.json");
    }

    #[test]
    fn test_all_three_shapes_match() {
        let mixed = dataset(
            "mixed.json",
            vec![
                json!({"addresses": [TARGET]}),
                json!({"properties": {"address": [TARGET]}}),
                json!({"address": TARGET}),
                json!({"label": "no address at all"}),
            ],
        );

        let hits = SanctionsMatcher::new().match_address(&TARGET.to_lowercase(), [&mixed]);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_flat_address_found_beside_address_list() {
        let aux = dataset(
            "aux.json",
            vec![json!({
                "addresses": ["0x0000000000000000000000000000000000000001"],
                "address": TARGET,
                "label": "Both fields"
            })],
        );

        let hits = SanctionsMatcher::new().match_address(TARGET, [&aux]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label.as_deref(), Some("Both fields"));
    }

    #[test]
    fn test_no_hits() {
        let aux = dataset("aux.json", vec![json!({"address": "0xabc"})]);
        let hits = SanctionsMatcher::new().match_address(TARGET, [&aux]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_summarize_fallbacks() {
        let aux = dataset(
            "aux.json",
            vec![
                json!({"address": TARGET}),
                json!({"properties": {"address": TARGET, "name": ["Hydra Market"], "country": ["ru"]}}),
            ],
        );
        let matcher = SanctionsMatcher::new();
        let hits = matcher.match_address(TARGET, [&aux]);
        let summary = matcher.summarize(&hits);

        assert_eq!(
            summary[0],
            SanctionSummary {
                label: "Unknown".to_string(),
                jurisdiction: "Unknown".to_string(),
                reason: "N/A".to_string(),
                source_file: "aux.json".to_string(),
            }
        );
        assert_eq!(summary[1].label, "Hydra Market");
        assert_eq!(summary[1].jurisdiction, "ru");
        assert_eq!(summary[1].reason, "N/A");
    }
}
