//! Documentation library records — manuals, ATBDs, brochures.
//!
//! Source shape: `{ title, url, file_type, size, description, mission }`.
//! The `mission` source key is emitted as `related_mission` in the
//! canonical payload.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use satgraph_core::Episode;

use crate::dataset::{opt_string, string_or, Dataset};

/// Placeholder identity for records with no usable `title`.
pub const PLACEHOLDER: &str = "Unknown Document";

/// Canonical documentation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Documentation {
    /// Document title; placeholder-substituted, never empty.
    pub title: String,
    /// Download or portal URL.
    pub url: Option<String>,
    /// File type as scraped (e.g. "pdf").
    pub file_type: Option<String>,
    /// Human-readable size as scraped (e.g. "2.3 MB"); numbers are
    /// stringified.
    pub size: Option<String>,
    /// Description text.
    pub description: Option<String>,
    /// Mission this document belongs to (source key `mission`).
    pub related_mission: Option<String>,
}

/// Normalizes a raw record. Total: never fails, never mutates `raw`.
pub fn normalize(raw: &Value) -> Documentation {
    Documentation {
        title: string_or(raw, "title", PLACEHOLDER),
        url: opt_string(raw, "url"),
        file_type: opt_string(raw, "file_type"),
        size: opt_string(raw, "size"),
        description: opt_string(raw, "description"),
        related_mission: opt_string(raw, "mission"),
    }
}

impl Documentation {
    /// Canonical episode body with `type` discriminator and `category` tag.
    pub fn body(&self) -> Value {
        json!({
            "type": "documentation",
            "title": self.title,
            "url": self.url,
            "file_type": self.file_type,
            "size": self.size,
            "description": self.description,
            "related_mission": self.related_mission,
            "category": "documentation",
        })
    }

    /// Converts the payload into a graph episode.
    pub fn to_episode(&self, reference_time: DateTime<Utc>) -> Episode {
        Episode::json(
            format!("Document: {}", self.title),
            serde_json::to_string_pretty(&self.body()).unwrap_or_else(|_| "{}".to_string()),
            Dataset::Documents.source_description(),
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
            "title": "INSAT-3D Data Products Handbook",
            "url": "https://portal.example/docs/insat3d.pdf",
            "file_type": "pdf",
            "size": "4.1 MB",
            "mission": "INSAT-3D",
        });
        let doc = normalize(&raw);
        assert_eq!(doc.title, "INSAT-3D Data Products Handbook");
        assert_eq!(doc.related_mission.as_deref(), Some("INSAT-3D"));
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let doc = normalize(&serde_json::json!({}));
        assert_eq!(doc.title, PLACEHOLDER);
        assert!(doc.url.is_none());
        assert!(doc.related_mission.is_none());
    }

    #[test]
    fn test_numeric_size_is_stringified() {
        let doc = normalize(&serde_json::json!({"title": "Guide", "size": 1024}));
        assert_eq!(doc.size.as_deref(), Some("1024"));
    }

    #[test]
    fn test_mission_key_renamed_in_body() {
        let body = normalize(&serde_json::json!({"title": "T", "mission": "Oceansat-2"})).body();
        assert_eq!(body["related_mission"], "Oceansat-2");
        assert!(body.get("mission").is_none());
        assert_eq!(body["category"], "documentation");
    }

    #[test]
    fn test_episode_name_placeholder() {
        let ep = normalize(&serde_json::json!({})).to_episode(Utc::now());
        assert_eq!(ep.name, "Document: Unknown Document");
    }
}
