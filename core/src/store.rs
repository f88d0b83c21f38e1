//! Pluggable graph-store trait.
//!
//! [`GraphStore`] is the interface boundary between the ingestion pipeline
//! and the concrete graph backend. A production implementation speaks bolt
//! to Neo4j (`satgraph_neo4j`); tests use in-memory mocks.
//!
//! The backend owns entity/relationship extraction, deduplication, and
//! temporal bookkeeping — the pipeline only submits episodes and reads
//! facts back out.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::episode::Episode;

/// A ranked fact record returned by free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactResult {
    /// Unique identifier for this fact.
    pub uuid: String,
    /// The factual statement retrieved from the knowledge graph.
    pub fact: String,
    /// When this fact became valid, if known (ISO 8601).
    #[serde(default)]
    pub valid_at: Option<String>,
    /// When this fact became invalid, if known (ISO 8601).
    #[serde(default)]
    pub invalid_at: Option<String>,
    /// UUID of the node this fact originates from, if known.
    #[serde(default)]
    pub source_node_uuid: Option<String>,
}

/// Connection-oriented client for a temporal knowledge graph backend.
///
/// Implementations must be cheap to drop: teardown of the underlying
/// connection happens either in [`close`](GraphStore::close) or on drop,
/// and callers are allowed to do both.
#[allow(async_fn_in_trait)]
pub trait GraphStore: Send + Sync {
    /// Runs an arbitrary query and returns the result rows as JSON objects
    /// keyed by column name.
    async fn execute(&self, query: &str) -> Result<Vec<serde_json::Value>>;

    /// Submits one episode for entity/relationship extraction.
    async fn add_episode(&self, episode: &Episode) -> Result<()>;

    /// Free-text search over extracted facts, ranked by relevance.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<FactResult>>;

    /// Ensures the indices and uniqueness constraints the ingestion layer
    /// requires exist. Must be idempotent: running it twice against an
    /// already-configured backend succeeds without further side effects.
    async fn ensure_indices(&self) -> Result<()>;

    /// Gracefully releases the underlying connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_result_optional_fields_default() {
        let json = r#"{"uuid":"f-1","fact":"INSAT-3D carries an imager"}"#;
        let fact: FactResult = serde_json::from_str(json).unwrap();
        assert_eq!(fact.uuid, "f-1");
        assert!(fact.valid_at.is_none());
        assert!(fact.invalid_at.is_none());
        assert!(fact.source_node_uuid.is_none());
    }

    #[test]
    fn test_fact_result_round_trip() {
        let fact = FactResult {
            uuid: "f-2".into(),
            fact: "Oceansat-2 was launched by ISRO".into(),
            valid_at: Some("2009-09-23T00:00:00Z".into()),
            invalid_at: None,
            source_node_uuid: Some("n-7".into()),
        };
        let json = serde_json::to_string(&fact).unwrap();
        let back: FactResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fact);
    }
}
