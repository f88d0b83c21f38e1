//! Data product catalog records.
//!
//! Source shape: `{ name, category, description, url, specifications: {...},
//! download_info: {...}, satellites: [...] }`. The `satellites` source key is
//! emitted as `related_satellites` in the canonical payload.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use satgraph_core::Episode;

use crate::dataset::{list_field, map_field, opt_string, string_or, Dataset};

/// Placeholder identity for records with no usable `name`.
pub const PLACEHOLDER: &str = "Unknown Product";

/// Canonical data product payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataProduct {
    /// Product name; placeholder-substituted, never empty.
    pub name: String,
    /// The product's own catalog category. Doubles as the episode's
    /// category tag.
    pub category: Option<String>,
    /// Product description text.
    pub description: Option<String>,
    /// Portal page URL.
    pub url: Option<String>,
    /// Technical specification table as scraped.
    pub specifications: serde_json::Map<String, Value>,
    /// Download endpoints and formats as scraped.
    pub download_info: serde_json::Map<String, Value>,
    /// Satellites this product is derived from (source key `satellites`).
    pub related_satellites: Vec<Value>,
}

/// Normalizes a raw record. Total: never fails, never mutates `raw`.
pub fn normalize(raw: &Value) -> DataProduct {
    DataProduct {
        name: string_or(raw, "name", PLACEHOLDER),
        category: opt_string(raw, "category"),
        description: opt_string(raw, "description"),
        url: opt_string(raw, "url"),
        specifications: map_field(raw, "specifications"),
        download_info: map_field(raw, "download_info"),
        related_satellites: list_field(raw, "satellites"),
    }
}

impl DataProduct {
    /// Canonical episode body with `type` discriminator and `category` tag.
    pub fn body(&self) -> Value {
        json!({
            "type": "data_product",
            "name": self.name,
            "category": self.category,
            "description": self.description,
            "url": self.url,
            "specifications": self.specifications,
            "download_info": self.download_info,
            "related_satellites": self.related_satellites,
        })
    }

    /// Converts the payload into a graph episode.
    pub fn to_episode(&self, reference_time: DateTime<Utc>) -> Episode {
        Episode::json(
            format!("Data Product: {}", self.name),
            serde_json::to_string_pretty(&self.body()).unwrap_or_else(|_| "{}".to_string()),
            Dataset::Products.source_description(),
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
            "name": "Sea Surface Temperature",
            "category": "Ocean",
            "url": "https://portal.example/sst",
            "specifications": {"resolution": "1 km"},
            "download_info": {"format": "HDF5"},
            "satellites": ["INSAT-3D", "INSAT-3DR"],
        });
        let product = normalize(&raw);
        assert_eq!(product.name, "Sea Surface Temperature");
        assert_eq!(product.category.as_deref(), Some("Ocean"));
        assert_eq!(product.related_satellites.len(), 2);
        assert_eq!(
            product.specifications.get("resolution").unwrap(),
            &serde_json::json!("1 km")
        );
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let product = normalize(&serde_json::json!({}));
        assert_eq!(product.name, PLACEHOLDER);
        assert!(product.category.is_none());
        assert!(product.specifications.is_empty());
        assert!(product.download_info.is_empty());
        assert!(product.related_satellites.is_empty());
    }

    #[test]
    fn test_satellites_key_renamed_in_body() {
        let raw = serde_json::json!({"name": "Rainfall", "satellites": ["Megha-Tropiques"]});
        let body = normalize(&raw).body();
        assert_eq!(
            body["related_satellites"],
            serde_json::json!(["Megha-Tropiques"])
        );
        assert!(body.get("satellites").is_none());
    }

    #[test]
    fn test_episode_name_placeholder() {
        let ep = normalize(&serde_json::json!({})).to_episode(Utc::now());
        assert_eq!(ep.name, "Data Product: Unknown Product");
    }

    #[test]
    fn test_body_type_discriminator() {
        let body = normalize(&serde_json::json!({"name": "Winds"})).body();
        assert_eq!(body["type"], "data_product");
    }
}
