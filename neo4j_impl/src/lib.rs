//! # Satgraph Neo4j
//!
//! Neo4j (bolt) implementation of the [`GraphStore`] trait plus the
//! backend-capability provisioning the ingestion pipeline runs before any
//! writes.
//!
//! This crate owns everything Neo4j-specific:
//!
//! - [`GraphClient`] — bolt connection handle implementing
//!   [`GraphStore`]: arbitrary query execution, episode submission,
//!   fulltext fact search, index/constraint bootstrap
//! - [`provision`] — the tiered capability negotiator that establishes a
//!   working target database (isolated, fallback, or community-edition
//!   single database)
//! - [`bootstrap`] — factory that provisions, connects, and ensures
//!   indices, retrying once with a fresh client on the database-mismatch
//!   error class
//!
//! Episodes are stored as `:Episodic` nodes; extracted facts live on
//! `:RELATES_TO` relationships carrying `fact`, `valid_at` and
//! `invalid_at` properties, which the fulltext `fact_text` index serves.

pub mod provision;

use anyhow::{Context, Result};
use chrono::Utc;
use neo4rs::{query, ConfigBuilder, Graph};
use tracing::{debug, info, warn};
use uuid::Uuid;

use satgraph_config::GraphConfig;
use satgraph_core::{Episode, FactResult, GraphStore};

pub use provision::{provision, Edition, Provisioned};

/// Index and constraint statements required before any episode write.
///
/// Every statement is `IF NOT EXISTS`, so running the bootstrap against an
/// already-configured database is a no-op.
const INDEX_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT entity_uuid IF NOT EXISTS FOR (n:Entity) REQUIRE n.uuid IS UNIQUE",
    "CREATE CONSTRAINT episodic_uuid IF NOT EXISTS FOR (n:Episodic) REQUIRE n.uuid IS UNIQUE",
    "CREATE INDEX entity_name IF NOT EXISTS FOR (n:Entity) ON (n.name)",
    "CREATE INDEX entity_group_id IF NOT EXISTS FOR (n:Entity) ON (n.group_id)",
    "CREATE INDEX episodic_valid_at IF NOT EXISTS FOR (n:Episodic) ON (n.valid_at)",
    "CREATE INDEX relates_to_uuid IF NOT EXISTS FOR ()-[r:RELATES_TO]-() ON (r.uuid)",
    "CREATE FULLTEXT INDEX fact_text IF NOT EXISTS FOR ()-[r:RELATES_TO]-() ON EACH [r.fact]",
    "CREATE FULLTEXT INDEX node_name_text IF NOT EXISTS FOR (n:Entity|Episodic) ON EACH [n.name]",
];

/// Bolt client for one Neo4j database.
pub struct GraphClient {
    graph: Graph,
    database: String,
}

impl GraphClient {
    /// Connects to the given database using the configured credentials.
    pub async fn connect(cfg: &GraphConfig, database: &str) -> Result<Self> {
        let bolt_config = ConfigBuilder::default()
            .uri(cfg.uri.as_str())
            .user(cfg.user.as_str())
            .password(cfg.password.as_str())
            .db(database)
            .build()
            .context("invalid bolt connection configuration")?;
        let graph = Graph::connect(bolt_config).await.with_context(|| {
            format!(
                "failed to connect to graph backend at {} (database '{}'). \
                 Check that the backend is running and the credentials are correct.",
                cfg.uri, database
            )
        })?;
        debug!(uri = %cfg.uri, database, "bolt connection established");
        Ok(Self {
            graph,
            database: database.to_string(),
        })
    }

    /// The database this client is bound to.
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl GraphStore for GraphClient {
    async fn execute(&self, q: &str) -> Result<Vec<serde_json::Value>> {
        let mut stream = self
            .graph
            .execute(query(q))
            .await
            .with_context(|| format!("query failed: {}", q))?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row.to::<serde_json::Value>()?);
        }
        Ok(rows)
    }

    async fn add_episode(&self, episode: &Episode) -> Result<()> {
        let q = query(
            "CREATE (e:Episodic {
                uuid: $uuid,
                name: $name,
                content: $content,
                source: $source,
                source_description: $source_description,
                valid_at: datetime($valid_at),
                created_at: datetime($created_at)
            })",
        )
        .param("uuid", Uuid::new_v4().to_string())
        .param("name", episode.name.as_str())
        .param("content", episode.body.as_str())
        .param("source", episode.source.as_str())
        .param("source_description", episode.source_description.as_str())
        .param("valid_at", episode.reference_time.to_rfc3339())
        .param("created_at", Utc::now().to_rfc3339());
        self.graph
            .run(q)
            .await
            .with_context(|| format!("episode submission failed: {}", episode.name))?;
        Ok(())
    }

    async fn search(&self, text: &str, limit: usize) -> Result<Vec<FactResult>> {
        let q = query(
            "CALL db.index.fulltext.queryRelationships('fact_text', $text)
             YIELD relationship AS rel, score
             RETURN rel.uuid AS uuid,
                    rel.fact AS fact,
                    toString(rel.valid_at) AS valid_at,
                    toString(rel.invalid_at) AS invalid_at,
                    startNode(rel).uuid AS source_node_uuid
             ORDER BY score DESC
             LIMIT $limit",
        )
        .param("text", text)
        .param("limit", limit as i64);
        let mut stream = self
            .graph
            .execute(q)
            .await
            .context("fact search query failed")?;
        let mut facts = Vec::new();
        while let Some(row) = stream.next().await? {
            facts.push(FactResult {
                uuid: row.get::<String>("uuid").unwrap_or_default(),
                fact: row.get::<String>("fact").unwrap_or_default(),
                valid_at: row.get::<String>("valid_at").ok(),
                invalid_at: row.get::<String>("invalid_at").ok(),
                source_node_uuid: row.get::<String>("source_node_uuid").ok(),
            });
        }
        Ok(facts)
    }

    async fn ensure_indices(&self) -> Result<()> {
        for stmt in INDEX_STATEMENTS {
            self.graph
                .run(query(stmt))
                .await
                .with_context(|| format!("index bootstrap statement failed: {}", stmt))?;
        }
        debug!(
            database = %self.database,
            statements = INDEX_STATEMENTS.len(),
            "indices and constraints ensured"
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Bolt connections are pooled; the pool is torn down when the last
        // clone of the handle drops. Nothing to flush here.
        debug!(database = %self.database, "releasing bolt connection pool");
        Ok(())
    }
}

/// Whether an error belongs to the "database mismatch" class: the backend
/// rejected operations because the session is bound to the wrong database.
/// Matched on the error text, which is all the bolt protocol surfaces.
pub fn is_database_mismatch(err: &anyhow::Error, database: &str) -> bool {
    let text = format!("{:#}", err).to_lowercase();
    text.contains("database") && text.contains(&database.to_lowercase())
}

/// Provisions a target database, connects, and ensures indices.
///
/// On the database-mismatch error class the client is dropped and
/// re-instantiated once before retrying the index bootstrap; a second
/// failure is permanent and reports the underlying cause. This is the one
/// entry point the loader uses to obtain a ready store.
pub async fn bootstrap(cfg: &GraphConfig) -> Result<GraphClient> {
    let provisioned = provision(cfg).await?;
    info!(
        database = %provisioned.database,
        used_fallback = provisioned.used_fallback,
        edition = %provisioned.edition,
        "graph database provisioned"
    );

    let client = GraphClient::connect(cfg, &provisioned.database).await?;
    match client.ensure_indices().await {
        Ok(()) => Ok(client),
        Err(err) if is_database_mismatch(&err, &provisioned.database) => {
            warn!(
                error = %err,
                "database mismatch during index bootstrap; re-instantiating client"
            );
            client.close().await.ok();
            drop(client);
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            let client = GraphClient::connect(cfg, &provisioned.database).await?;
            client
                .ensure_indices()
                .await
                .context("index bootstrap failed again after client re-instantiation")?;
            info!("index bootstrap succeeded after retry");
            Ok(client)
        }
        Err(err) => Err(err.context(
            "index bootstrap failed. Check that the target database is online \
             and the configured user may create indices",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_statements_are_idempotent() {
        assert!(!INDEX_STATEMENTS.is_empty());
        for stmt in INDEX_STATEMENTS {
            assert!(
                stmt.contains("IF NOT EXISTS"),
                "statement is not idempotent: {stmt}"
            );
        }
    }

    #[test]
    fn test_fulltext_fact_index_present() {
        assert!(INDEX_STATEMENTS
            .iter()
            .any(|s| s.contains("FULLTEXT") && s.contains("fact_text")));
    }

    #[test]
    fn test_database_mismatch_classification() {
        let err = anyhow::anyhow!("Unable to route to database 'satgraph_db'");
        assert!(is_database_mismatch(&err, "satgraph_db"));
        assert!(!is_database_mismatch(&err, "neo4j"));

        let unrelated = anyhow::anyhow!("connection refused");
        assert!(!is_database_mismatch(&unrelated, "satgraph_db"));
    }

    #[test]
    fn test_database_mismatch_reads_error_chain() {
        let root = anyhow::anyhow!("database 'portal_db' not found");
        let wrapped = root.context("index bootstrap statement failed");
        assert!(is_database_mismatch(&wrapped, "portal_db"));
    }
}
