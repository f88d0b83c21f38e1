//! Mission technical metadata records — sensors, orbits, launch data.
//!
//! Source shape: `{ mission, sensors: [...], launch_date, agency,
//! orbit_type, applications: [...], technical_specs: {...} }`.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use satgraph_core::Episode;

use crate::dataset::{list_field, map_field, opt_string, string_or, Dataset};

/// Placeholder identity for records with no usable `mission`.
pub const PLACEHOLDER: &str = "Unknown";

/// Canonical mission metadata payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionMetadata {
    /// Mission name; placeholder-substituted, never empty.
    pub mission: String,
    /// Onboard sensors.
    pub sensors: Vec<Value>,
    /// Launch date as scraped.
    pub launch_date: Option<String>,
    /// Operating agency.
    pub agency: Option<String>,
    /// Orbit classification (e.g. "geostationary").
    pub orbit_type: Option<String>,
    /// Application areas.
    pub applications: Vec<Value>,
    /// Free-form technical specification table.
    pub technical_specs: serde_json::Map<String, Value>,
}

/// Normalizes a raw record. Total: never fails, never mutates `raw`.
pub fn normalize(raw: &Value) -> MissionMetadata {
    MissionMetadata {
        mission: string_or(raw, "mission", PLACEHOLDER),
        sensors: list_field(raw, "sensors"),
        launch_date: opt_string(raw, "launch_date"),
        agency: opt_string(raw, "agency"),
        orbit_type: opt_string(raw, "orbit_type"),
        applications: list_field(raw, "applications"),
        technical_specs: map_field(raw, "technical_specs"),
    }
}

impl MissionMetadata {
    /// Canonical episode body with `type` discriminator and `category` tag.
    pub fn body(&self) -> Value {
        json!({
            "type": "mission_metadata",
            "mission": self.mission,
            "sensors": self.sensors,
            "launch_date": self.launch_date,
            "agency": self.agency,
            "orbit_type": self.orbit_type,
            "applications": self.applications,
            "technical_specs": self.technical_specs,
            "category": "metadata",
        })
    }

    /// Converts the payload into a graph episode.
    pub fn to_episode(&self, reference_time: DateTime<Utc>) -> Episode {
        Episode::json(
            format!("Mission Metadata: {}", self.mission),
            serde_json::to_string_pretty(&self.body()).unwrap_or_else(|_| "{}".to_string()),
            Dataset::MissionMetadata.source_description(),
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
            "mission": "Megha-Tropiques",
            "sensors": ["MADRAS", "SAPHIR", "ScaRaB"],
            "launch_date": "2011-10-12",
            "agency": "ISRO/CNES",
            "orbit_type": "low inclination",
            "applications": ["tropical water cycle"],
            "technical_specs": {"altitude_km": 867},
        });
        let meta = normalize(&raw);
        assert_eq!(meta.mission, "Megha-Tropiques");
        assert_eq!(meta.sensors.len(), 3);
        assert_eq!(meta.agency.as_deref(), Some("ISRO/CNES"));
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let meta = normalize(&serde_json::json!({}));
        assert_eq!(meta.mission, PLACEHOLDER);
        assert!(meta.sensors.is_empty());
        assert!(meta.applications.is_empty());
        assert!(meta.technical_specs.is_empty());
        assert!(meta.launch_date.is_none());
    }

    #[test]
    fn test_body_type_and_category() {
        let body = normalize(&serde_json::json!({"mission": "SARAL"})).body();
        assert_eq!(body["type"], "mission_metadata");
        assert_eq!(body["category"], "metadata");
        assert_eq!(body["sensors"], serde_json::json!([]));
    }

    #[test]
    fn test_episode_name_prefix() {
        let ep = normalize(&serde_json::json!({"mission": "SARAL"})).to_episode(Utc::now());
        assert_eq!(ep.name, "Mission Metadata: SARAL");
    }
}
