//! Satellite mission records — scraped mission overview pages.
//!
//! Source shape: `{ name, url, description, documents: [...] }`, every field
//! optional.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use satgraph_core::Episode;

use crate::dataset::{list_field, opt_string, string_or, Dataset};

/// Placeholder identity for records with no usable `name`.
pub const PLACEHOLDER: &str = "Unknown";

/// Canonical satellite mission payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteMission {
    /// Mission name; placeholder-substituted, never empty.
    pub name: String,
    /// Portal page URL.
    pub url: Option<String>,
    /// Mission description text.
    pub description: Option<String>,
    /// Linked documents as scraped (shape varies by page).
    pub documents: Vec<Value>,
}

/// Normalizes a raw record. Total: never fails, never mutates `raw`.
pub fn normalize(raw: &Value) -> SatelliteMission {
    SatelliteMission {
        name: string_or(raw, "name", PLACEHOLDER),
        url: opt_string(raw, "url"),
        description: opt_string(raw, "description"),
        documents: list_field(raw, "documents"),
    }
}

impl SatelliteMission {
    /// Canonical episode body with `type` discriminator and `category` tag.
    pub fn body(&self) -> Value {
        json!({
            "type": "satellite_mission",
            "name": self.name,
            "url": self.url,
            "description": self.description,
            "documents": self.documents,
            "category": "satellite",
        })
    }

    /// Converts the payload into a graph episode.
    pub fn to_episode(&self, reference_time: DateTime<Utc>) -> Episode {
        Episode::json(
            format!("Satellite Mission: {}", self.name),
            serde_json::to_string_pretty(&self.body()).unwrap_or_else(|_| "{}".to_string()),
            Dataset::Satellites.source_description(),
            reference_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_record() {
        let raw = serde_json::json!({
            "name": "INSAT-3D",
            "url": "https://portal.example/insat-3d",
            "description": "Meteorological satellite",
            "documents": [{"title": "Handbook"}],
        });
        let mission = normalize(&raw);
        assert_eq!(mission.name, "INSAT-3D");
        assert_eq!(mission.documents.len(), 1);
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let mission = normalize(&serde_json::json!({}));
        assert_eq!(mission.name, PLACEHOLDER);
        assert!(mission.url.is_none());
        assert!(mission.description.is_none());
        assert!(mission.documents.is_empty());
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let raw = serde_json::json!({"name": "Oceansat-2"});
        let before = raw.clone();
        let _ = normalize(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_episode_name_has_prefix_and_placeholder() {
        let ep = normalize(&serde_json::json!({})).to_episode(Utc::now());
        assert_eq!(ep.name, "Satellite Mission: Unknown");
        assert!(!ep.name.is_empty());
    }

    #[test]
    fn test_body_carries_type_and_category() {
        let body = normalize(&serde_json::json!({"name": "Kalpana-1"})).body();
        assert_eq!(body["type"], "satellite_mission");
        assert_eq!(body["category"], "satellite");
        assert_eq!(body["documents"], serde_json::json!([]));
    }
}
