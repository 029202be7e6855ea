//! Dataset loading
//!
//! Loads the malicious-contract registry, the core sanctions list and every
//! auxiliary dataset file from a data directory. Problems with a single file
//! or line never abort the load: they are logged and kept as
//! [`LoadDiagnostic`]s on the resulting [`DatasetCatalog`].

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::error::Error;

use super::types::{Dataset, MaliciousContract, MaliciousRegistry, SanctionEntity};

/// What went wrong while loading a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiagnosticKind {
    /// Core file absent, treated as empty
    MissingFile,
    /// File or directory could not be read
    Unreadable,
    /// Whole file rejected
    MalformedFile,
    /// One JSON line dropped (1-based)
    MalformedLine { line: usize },
    /// One array element dropped (0-based)
    MalformedRecord { index: usize },
    /// Record parsed but was not a JSON object
    NonObjectRecord { position: usize },
}

/// A non-fatal dataset load problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadDiagnostic {
    pub source_file: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub detail: String,
}

/// Everything a screening engine consults, loaded once
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    pub malicious: MaliciousRegistry,
    pub core: Dataset,
    pub auxiliary: Vec<Dataset>,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl DatasetCatalog {
    /// Core list first, then auxiliary lists
    pub fn sanctions_datasets(&self) -> impl Iterator<Item = &Dataset> {
        std::iter::once(&self.core).chain(self.auxiliary.iter())
    }

    /// Registry + core list + every auxiliary file that loaded
    pub fn sources_count(&self) -> usize {
        2 + self.auxiliary.len()
    }

    pub fn sanctions_record_count(&self) -> usize {
        self.sanctions_datasets().map(Dataset::len).sum()
    }
}

/// Reads dataset files, accumulating diagnostics
#[derive(Debug, Default)]
pub struct DatasetLoader {
    diagnostics: Vec<LoadDiagnostic>,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every dataset named by the configuration
    pub fn load(config: &DatasetConfig) -> DatasetCatalog {
        let mut loader = Self::new();

        let malicious = loader.load_malicious_registry(&config.malicious_registry_path());
        let core = loader.load_sanctions_core(&config.sanctions_core_path());
        let auxiliary = loader.load_auxiliary(&config.data_dir, &config.core_files());

        let catalog = DatasetCatalog {
            malicious: MaliciousRegistry::new(malicious),
            core,
            auxiliary,
            diagnostics: loader.into_diagnostics(),
        };

        info!(
            "Loaded datasets: {} malicious contracts, {} core sanctions records, {} auxiliary files ({} records), {} diagnostics",
            catalog.malicious.len(),
            catalog.core.len(),
            catalog.auxiliary.len(),
            catalog.auxiliary.iter().map(Dataset::len).sum::<usize>(),
            catalog.diagnostics.len()
        );

        catalog
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<LoadDiagnostic> {
        self.diagnostics
    }

    /// Parse the malicious-contract registry (a JSON array).
    ///
    /// A missing file yields an empty list.
    pub fn load_malicious_registry(&mut self, path: &Path) -> Vec<MaliciousContract> {
        let name = file_name(path);
        let Some(content) = self.read_optional(path, &name) else {
            return Vec::new();
        };

        let items: Vec<Value> = match serde_json::from_str(&content) {
            Ok(items) => items,
            Err(e) => {
                self.report(&name, DiagnosticKind::MalformedFile, e.to_string());
                return Vec::new();
            }
        };

        let mut contracts = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<MaliciousContract>(item) {
                Ok(contract) => contracts.push(contract),
                Err(e) => {
                    self.report(&name, DiagnosticKind::MalformedRecord { index }, e.to_string())
                }
            }
        }

        debug!("Loaded {} malicious contracts from {}", contracts.len(), name);
        contracts
    }

    /// Parse the core sanctions list (newline-delimited JSON).
    ///
    /// A missing file yields an empty dataset.
    pub fn load_sanctions_core(&mut self, path: &Path) -> Dataset {
        let name = file_name(path);
        let mut dataset = Dataset::new(name.clone());

        if let Some(content) = self.read_optional(path, &name) {
            let records = self.parse_json_lines(&content, &name);
            dataset.entities = self.tag_records(records, &name);
        }

        debug!("Loaded {} core sanctions records from {}", dataset.len(), name);
        dataset
    }

    /// Load every `*.json` file in `directory` except the excluded names.
    ///
    /// Files are visited in filename order. A file that cannot be read or
    /// parsed is skipped; the rest still load.
    pub fn load_auxiliary(&mut self, directory: &Path, exclude: &[&str]) -> Vec<Dataset> {
        let mut files = match self.list_json_files(directory) {
            Ok(files) => files,
            Err(e) => {
                if directory.exists() {
                    self.report(
                        &directory.display().to_string(),
                        DiagnosticKind::Unreadable,
                        e.to_string(),
                    );
                } else {
                    debug!("Dataset directory {} not found", directory.display());
                }
                return Vec::new();
            }
        };
        files.retain(|(name, _)| !exclude.contains(&name.as_str()));
        files.sort();

        let mut datasets = Vec::with_capacity(files.len());
        for (name, path) in files {
            match self.load_auxiliary_file(&path, &name) {
                Ok(dataset) => {
                    debug!("Loaded {} records from auxiliary dataset {}", dataset.len(), name);
                    datasets.push(dataset);
                }
                Err(e) => self.report(&name, diagnostic_kind(&e), e.to_string()),
            }
        }
        datasets
    }

    fn load_auxiliary_file(&mut self, path: &Path, name: &str) -> Result<Dataset, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::DatasetIo {
            file: name.to_string(),
            reason: e.to_string(),
        })?;

        let records = if content.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<Value>>(&content).map_err(|e| Error::DatasetParse {
                file: name.to_string(),
                reason: e.to_string(),
            })?
        } else {
            self.parse_json_lines(&content, name)
        };

        Ok(Dataset {
            source_file: name.to_string(),
            entities: self.tag_records(records, name),
        })
    }

    /// Parse one JSON value per non-blank line, dropping bad lines
    fn parse_json_lines(&mut self, content: &str, name: &str) -> Vec<Value> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(value) => records.push(value),
                Err(e) => {
                    dropped += 1;
                    self.diagnostics.push(LoadDiagnostic {
                        source_file: name.to_string(),
                        kind: DiagnosticKind::MalformedLine { line: idx + 1 },
                        detail: e.to_string(),
                    });
                }
            }
        }

        if dropped > 0 {
            warn!("Dropped {} malformed lines from {}", dropped, name);
        }
        records
    }

    /// Keep map-shaped records, normalized and tagged with their source file
    fn tag_records(&mut self, records: Vec<Value>, name: &str) -> Vec<SanctionEntity> {
        let mut entities = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            match record.as_object() {
                Some(map) => entities.push(SanctionEntity::from_record(map, name)),
                None => self.diagnostics.push(LoadDiagnostic {
                    source_file: name.to_string(),
                    kind: DiagnosticKind::NonObjectRecord { position },
                    detail: format!("expected object, got {}", json_kind(&record)),
                }),
            }
        }
        entities
    }

    fn list_json_files(&self, directory: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            let is_json = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if path.is_file() && is_json {
                files.push((file_name(&path), path));
            }
        }
        Ok(files)
    }

    /// Read a file that may legitimately be absent
    fn read_optional(&mut self, path: &Path, name: &str) -> Option<String> {
        if !path.exists() {
            self.report(name, DiagnosticKind::MissingFile, format!("{} not found", path.display()));
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                self.report(name, DiagnosticKind::Unreadable, e.to_string());
                None
            }
        }
    }

    fn report(&mut self, source_file: &str, kind: DiagnosticKind, detail: String) {
        warn!("Dataset {}: {:?} - {}", source_file, kind, detail);
        self.diagnostics.push(LoadDiagnostic {
            source_file: source_file.to_string(),
            kind,
            detail,
        });
    }
}

fn diagnostic_kind(error: &Error) -> DiagnosticKind {
    match error {
        Error::DatasetIo { .. } => DiagnosticKind::Unreadable,
        _ => DiagnosticKind::MalformedFile,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
