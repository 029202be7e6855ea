//! CLI command implementations

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::dataset::{Dataset, DatasetLoader};
use crate::engine::ScreeningEngine;

/// Screen one address and print the report (or error object) as JSON
pub async fn check(config: &Config, address: &str) -> Result<()> {
    let engine = ScreeningEngine::from_config(config);

    if !engine.catalog().diagnostics.is_empty() {
        warn!(
            "{} dataset diagnostics, run `datasets` for details",
            engine.catalog().diagnostics.len()
        );
    }

    info!("Screening {}...", address);
    let value = engine.screen_value(address).await;
    let rendered = serde_json::to_string_pretty(&value).context("Failed to render report")?;
    println!("{}", rendered);

    Ok(())
}

/// Show loaded datasets and any load diagnostics
pub fn datasets(config: &Config) -> Result<()> {
    let catalog = DatasetLoader::load(&config.datasets);

    println!("\n=== DATASETS ({}) ===\n", config.datasets.data_dir.display());
    println!(
        "Malicious registry ({}): {} contracts",
        config.datasets.malicious_registry_file,
        catalog.malicious.len()
    );
    print_dataset("Core sanctions", &catalog.core);
    for dataset in &catalog.auxiliary {
        print_dataset("Auxiliary", dataset);
    }
    println!(
        "\nSources: {}, sanctions records: {}",
        catalog.sources_count(),
        catalog.sanctions_record_count()
    );

    if catalog.diagnostics.is_empty() {
        println!("\nNo diagnostics.");
    } else {
        println!("\n=== DIAGNOSTICS ===\n");
        for diag in &catalog.diagnostics {
            println!("{}: {:?} - {}", diag.source_file, diag.kind, diag.detail);
        }
    }

    Ok(())
}

fn print_dataset(kind: &str, dataset: &Dataset) {
    let (per_shape, unaddressed) = dataset.shape_breakdown();
    let shapes: Vec<String> = per_shape
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(shape, count)| format!("{} {}", shape.as_str(), count))
        .collect();

    println!(
        "{} ({}): {} records [{}], {} without address",
        kind,
        dataset.source_file,
        dataset.len(),
        shapes.join(", "),
        unaddressed
    );
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
