//! Dataset router — maps a dataset identifier to its file and normalizer.
//!
//! The dataset set is a fixed enumeration; an identifier outside it fails
//! before any file I/O. File-level problems (missing, unreadable, not an
//! array, empty) are classified so the orchestrator can count the dataset
//! failed without aborting the batch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use satgraph_core::Episode;

use crate::{documents, faqs, missions, products, satellites};

/// The fixed set of portal datasets the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Satellite mission pages (`satellites.json`).
    Satellites,
    /// Data product catalog (`products.json`).
    Products,
    /// Documentation library metadata (`documents.json`).
    Documents,
    /// Mission technical metadata (`mission_metadata.json`).
    MissionMetadata,
    /// FAQ knowledge base (`faqs.json`).
    Faqs,
}

impl Dataset {
    /// All datasets in their fixed load order.
    pub const ALL: [Dataset; 5] = [
        Dataset::Satellites,
        Dataset::Products,
        Dataset::Documents,
        Dataset::MissionMetadata,
        Dataset::Faqs,
    ];

    /// The dataset identifier, as accepted by [`Dataset::from_str`].
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Satellites => "satellites",
            Dataset::Products => "products",
            Dataset::Documents => "documents",
            Dataset::MissionMetadata => "mission_metadata",
            Dataset::Faqs => "faqs",
        }
    }

    /// File name of the dataset inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Satellites => "satellites.json",
            Dataset::Products => "products.json",
            Dataset::Documents => "documents.json",
            Dataset::MissionMetadata => "mission_metadata.json",
            Dataset::Faqs => "faqs.json",
        }
    }

    /// Static provenance string attached to every episode of this dataset.
    pub fn source_description(&self) -> &'static str {
        match self {
            Dataset::Satellites => "Satellite Mission Data",
            Dataset::Products => "Product Catalog",
            Dataset::Documents => "Documentation Library",
            Dataset::MissionMetadata => "Mission Technical Metadata",
            Dataset::Faqs => "FAQ Knowledge Base",
        }
    }

    /// Resolves the dataset's file path under `data_dir`. No I/O.
    pub fn resolve(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }

    /// Reads and parses the dataset file into raw records.
    ///
    /// Records are returned in file order; the loader must not reorder them.
    pub fn read_records(&self, data_dir: &Path) -> Result<Vec<Value>, DatasetError> {
        let path = self.resolve(data_dir);
        if !path.exists() {
            return Err(DatasetError::NotFound { path });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| DatasetError::Io {
            dataset: *self,
            message: e.to_string(),
        })?;
        let parsed: Value =
            serde_json::from_str(&contents).map_err(|e| DatasetError::Parse {
                dataset: *self,
                message: e.to_string(),
            })?;
        match parsed {
            Value::Array(records) if records.is_empty() => {
                Err(DatasetError::Empty { dataset: *self })
            }
            Value::Array(records) => Ok(records),
            Value::Null => Err(DatasetError::Empty { dataset: *self }),
            other => Err(DatasetError::Parse {
                dataset: *self,
                message: format!(
                    "expected an array of records, got {}",
                    json_type_name(&other)
                ),
            }),
        }
    }

    /// Normalizes one raw record into an episode via this dataset's
    /// normalizer. Total: any JSON object produces an episode.
    pub fn episode(&self, raw: &Value, reference_time: DateTime<Utc>) -> Episode {
        match self {
            Dataset::Satellites => satellites::normalize(raw).to_episode(reference_time),
            Dataset::Products => products::normalize(raw).to_episode(reference_time),
            Dataset::Documents => documents::normalize(raw).to_episode(reference_time),
            Dataset::MissionMetadata => missions::normalize(raw).to_episode(reference_time),
            Dataset::Faqs => faqs::normalize(raw).to_episode(reference_time),
        }
    }

    /// The identity field of a raw record of this dataset, for log messages.
    /// Falls back to the per-kind placeholder when absent.
    pub fn record_identity(&self, raw: &Value) -> String {
        match self {
            Dataset::Satellites => satellites::normalize(raw).name,
            Dataset::Products => products::normalize(raw).name,
            Dataset::Documents => documents::normalize(raw).title,
            Dataset::MissionMetadata => missions::normalize(raw).mission,
            Dataset::Faqs => faqs::normalize(raw).question,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "satellites" => Ok(Dataset::Satellites),
            "products" => Ok(Dataset::Products),
            "documents" => Ok(Dataset::Documents),
            "mission_metadata" => Ok(Dataset::MissionMetadata),
            "faqs" => Ok(Dataset::Faqs),
            other => Err(DatasetError::Unknown {
                name: other.to_string(),
            }),
        }
    }
}

/// Classified dataset-level load failures.
///
/// All of these are fatal to their dataset only; the batch continues.
#[derive(Debug)]
pub enum DatasetError {
    /// The identifier is not in the fixed dataset enumeration.
    Unknown { name: String },
    /// The dataset file does not exist.
    NotFound { path: PathBuf },
    /// The dataset file exists but could not be read.
    Io { dataset: Dataset, message: String },
    /// The dataset file is not valid JSON or not an array of records.
    Parse { dataset: Dataset, message: String },
    /// The dataset parsed to no records.
    Empty { dataset: Dataset },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Unknown { name } => {
                write!(
                    f,
                    "unknown dataset '{}' (expected one of: satellites, products, documents, mission_metadata, faqs)",
                    name
                )
            }
            DatasetError::NotFound { path } => {
                write!(f, "dataset file not found: {}", path.display())
            }
            DatasetError::Io { dataset, message } => {
                write!(f, "failed to read {}: {}", dataset.file_name(), message)
            }
            DatasetError::Parse { dataset, message } => {
                write!(f, "failed to parse {}: {}", dataset.file_name(), message)
            }
            DatasetError::Empty { dataset } => {
                write!(f, "no data found in {}", dataset)
            }
        }
    }
}

impl std::error::Error for DatasetError {}

impl DatasetError {
    /// Whether this failure is the benign "file parsed to no records" case.
    pub fn is_empty(&self) -> bool {
        matches!(self, DatasetError::Empty { .. })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Shared field-extraction helpers for the normalizers
// ---------------------------------------------------------------------------

/// Optional string field. Numbers are stringified (scrapers are inconsistent
/// about e.g. file sizes); other shapes count as absent.
pub(crate) fn opt_string(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Required identity field, degraded to `placeholder` when absent or blank.
pub(crate) fn string_or(raw: &Value, key: &str, placeholder: &str) -> String {
    match opt_string(raw, key) {
        Some(s) if !s.trim().is_empty() => s,
        _ => placeholder.to_string(),
    }
}

/// List field, defaulting to an empty list.
pub(crate) fn list_field(raw: &Value, key: &str) -> Vec<Value> {
    raw.get(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Object field, defaulting to an empty object.
pub(crate) fn map_field(raw: &Value, key: &str) -> serde_json::Map<String, Value> {
    raw.get(key)
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_fixed_order() {
        let names: Vec<_> = Dataset::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "satellites",
                "products",
                "documents",
                "mission_metadata",
                "faqs"
            ]
        );
    }

    #[test]
    fn test_from_str_round_trip() {
        for dataset in Dataset::ALL {
            assert_eq!(dataset.name().parse::<Dataset>().unwrap(), dataset);
        }
    }

    #[test]
    fn test_unknown_dataset_fails_before_io() {
        let err = "galleries".parse::<Dataset>().unwrap_err();
        assert!(matches!(err, DatasetError::Unknown { .. }));
        assert!(err.to_string().contains("galleries"));
    }

    #[test]
    fn test_read_records_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::Faqs.read_records(dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn test_read_records_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faqs.json"), "[]").unwrap();
        let err = Dataset::Faqs.read_records(dir.path()).unwrap_err();
        assert!(err.is_empty());
    }

    #[test]
    fn test_read_records_not_an_array() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faqs.json"), r#"{"question":"Q"}"#).unwrap();
        let err = Dataset::Faqs.read_records(dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_read_records_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("products.json")).unwrap();
        f.write_all(b"[{\"name\": ").unwrap();
        let err = Dataset::Products.read_records(dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_read_records_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("satellites.json"),
            r#"[{"name":"A"},{"name":"B"},{"name":"C"}]"#,
        )
        .unwrap();
        let records = Dataset::Satellites.read_records(dir.path()).unwrap();
        let names: Vec<_> = records
            .iter()
            .map(|r| r.get("name").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_helpers_tolerate_shapes() {
        let raw = serde_json::json!({
            "size": 42,
            "tags": "not-a-list",
            "specs": ["not-a-map"],
        });
        assert_eq!(opt_string(&raw, "size").as_deref(), Some("42"));
        assert_eq!(opt_string(&raw, "missing"), None);
        assert!(list_field(&raw, "tags").is_empty());
        assert!(map_field(&raw, "specs").is_empty());
        assert_eq!(string_or(&raw, "missing", "Unknown"), "Unknown");
    }
}
