//! Episode model — the atomic unit written to the temporal knowledge graph.
//!
//! An episode is a named, timestamped fact-bearing document. The graph
//! backend performs its own entity/relationship extraction and temporal
//! bookkeeping on submission; the pipeline only has to produce a coherent
//! `{name, body, source, source_description, reference_time}` record.
//!
//! All episodes of a single ingestion run carry the same `reference_time`
//! (the run's UTC start), so the whole load is temporally coherent in the
//! graph's bi-temporal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance marker for an episode body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    /// Structured JSON payload (the only source kind this pipeline emits).
    Json,
    /// Free-form text (supported by the graph protocol, unused by the loader).
    Text,
}

impl EpisodeSource {
    /// Wire name of the source kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeSource::Json => "json",
            EpisodeSource::Text => "text",
        }
    }
}

/// A single episode ready for submission to the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Human-readable label, derived from the record's identity field.
    /// Never empty — missing identities degrade to a placeholder upstream.
    pub name: String,
    /// Canonical JSON payload with `type` discriminator and `category` tag.
    pub body: String,
    /// Provenance of the body.
    pub source: EpisodeSource,
    /// Static string naming the originating dataset.
    pub source_description: String,
    /// The ingestion run's shared UTC start timestamp.
    pub reference_time: DateTime<Utc>,
}

impl Episode {
    /// Builds a JSON episode from an already-serialized payload body.
    pub fn json(
        name: impl Into<String>,
        body: impl Into<String>,
        source_description: impl Into<String>,
        reference_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            source: EpisodeSource::Json,
            source_description: source_description.into(),
            reference_time,
        }
    }
}
