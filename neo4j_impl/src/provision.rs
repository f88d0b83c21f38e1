//! Backend capability negotiation — establish a usable target database.
//!
//! Editions differ in what they allow: enterprise backends support multiple
//! isolated databases, community backends expose exactly one. The negotiator
//! probes what is available and walks an ordered list of strategies, stopping
//! at the first that yields a working database:
//!
//! 1. The isolated database already exists — use it.
//! 2. Create it, trying several quoting variants ("already exists" counts
//!    as success; a name rejection falls through to the workarounds).
//! 3. Workarounds, in order: reuse the pre-existing fallback database;
//!    create an alternate-named database; community-edition mode on the
//!    single available database.
//!
//! Reusing a shared database risks stale-data conflicts. Clearing it is
//! destructive to anything else stored there, so the wipe only runs when
//! `graph.wipe_fallback_database` is set, and is logged before it executes.
//!
//! This is a best-effort bootstrap: concurrent provisioning attempts are
//! not coordinated, and a single bootstrapping process is assumed.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use satgraph_config::GraphConfig;
use satgraph_core::GraphStore;

use crate::GraphClient;

/// Backend edition, as reported by the version probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    /// Multi-database capable.
    Enterprise,
    /// Single database only.
    Community,
    /// Probe failed; treated as the most restrictive tier.
    Unknown,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Enterprise => f.write_str("enterprise"),
            Edition::Community => f.write_str("community"),
            Edition::Unknown => f.write_str("unknown"),
        }
    }
}

/// Outcome of successful provisioning.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// The database all subsequent writes must target.
    pub database: String,
    /// Whether a workaround database is in use instead of the isolated one.
    pub used_fallback: bool,
    /// Edition reported by the backend.
    pub edition: Edition,
}

/// Outcome of one provisioning strategy.
enum Provision {
    /// A working database was established.
    Ready(Provisioned),
    /// This strategy does not apply; try the next one.
    Continue,
    /// No further strategy can succeed.
    Fatal(String),
}

/// The ordered workaround strategies (spec'd tier 3).
const WORKAROUNDS: [Workaround; 3] = [
    Workaround::UseFallbackDatabase,
    Workaround::CreateAlternateDatabase,
    Workaround::CommunityMode,
];

#[derive(Debug, Clone, Copy)]
enum Workaround {
    UseFallbackDatabase,
    CreateAlternateDatabase,
    CommunityMode,
}

/// Establishes a usable target database for all subsequent writes.
///
/// Connects an administrative session on the fallback database (admin
/// commands route from any database), probes capabilities, and walks the
/// tiered strategy list. Errors carry operator guidance.
pub async fn provision(cfg: &GraphConfig) -> Result<Provisioned> {
    let link = GraphClient::connect(cfg, &cfg.fallback_database)
        .await
        .context(
            "could not reach the graph backend for provisioning. \
             Check that it is running on the configured bolt URI and that \
             the credentials in the [graph] config section are correct",
        )?;

    let edition = probe_edition(&link).await;
    info!(%edition, "graph backend probed");

    match list_databases(&link).await {
        Ok(databases) => {
            info!(?databases, "available databases");
            if databases.iter().any(|d| d == &cfg.database) {
                info!(database = %cfg.database, "isolated database already exists");
                return Ok(Provisioned {
                    database: cfg.database.clone(),
                    used_fallback: false,
                    edition,
                });
            }
            create_database(&link, cfg, edition).await
        }
        Err(err) => {
            // Single-database backend: listing is unsupported (or failed for
            // a reason we cannot distinguish from it). Straight to the
            // community-edition tier.
            warn!(error = %err, "multi-database listing unavailable");
            match community_mode(&link, cfg, edition).await {
                Provision::Ready(p) => Ok(p),
                Provision::Fatal(msg) => bail!(
                    "graph backend provisioning failed: {}. \
                     Check that the backend is running and reachable, verify \
                     the configured credentials, or point graph.database at \
                     the backend's default database.",
                    msg
                ),
                Provision::Continue => bail!(
                    "single-database mode could not be established. Check \
                     that the backend is running on the configured bolt URI \
                     and that the credentials are correct."
                ),
            }
        }
    }
}

/// Attempts to create the isolated database, trying quoting variants in
/// sequence; the first accepted variant wins.
async fn create_database(
    link: &GraphClient,
    cfg: &GraphConfig,
    edition: Edition,
) -> Result<Provisioned> {
    info!(database = %cfg.database, "creating isolated database");
    let variants = quoting_variants(&cfg.database);
    let mut last_error = String::new();

    for (i, stmt) in variants.iter().enumerate() {
        info!("attempt {}: {}", i + 1, stmt);
        match link.execute(stmt).await {
            Ok(_) => {
                info!(database = %cfg.database, "database created");
                // Give the backend a moment to bring the database online.
                tokio::time::sleep(Duration::from_secs(cfg.settle_secs)).await;
                if database_is_online(link, &cfg.database).await {
                    return Ok(Provisioned {
                        database: cfg.database.clone(),
                        used_fallback: false,
                        edition,
                    });
                }
                warn!(database = %cfg.database, "database did not come online; trying workarounds");
                return run_workarounds(link, cfg, edition).await;
            }
            Err(err) => {
                let msg = format!("{:#}", err).to_lowercase();
                if msg.contains("already exists") {
                    info!(database = %cfg.database, "database already exists");
                    return Ok(Provisioned {
                        database: cfg.database.clone(),
                        used_fallback: false,
                        edition,
                    });
                }
                last_error = msg;
            }
        }
    }

    warn!(error = %last_error, "all creation variants failed");
    if is_illegal_name(&last_error) {
        // The backend rejects the name outright; no variant will ever work.
        warn!(database = %cfg.database, "database name rejected; trying workarounds");
        run_workarounds(link, cfg, edition).await
    } else if is_unsupported(&last_error) {
        warn!("database creation unsupported on this edition");
        match community_mode(link, cfg, Edition::Community).await {
            Provision::Ready(p) => Ok(p),
            _ => bail!(
                "database creation is unsupported and the single-database \
                 fallback failed: {}",
                last_error
            ),
        }
    } else {
        run_workarounds(link, cfg, edition).await
    }
}

/// Walks the ordered workaround strategies; first `Ready` wins, `Fatal`
/// stops the walk.
async fn run_workarounds(
    link: &GraphClient,
    cfg: &GraphConfig,
    edition: Edition,
) -> Result<Provisioned> {
    info!("attempting workaround strategies");
    for workaround in WORKAROUNDS {
        let outcome = match workaround {
            Workaround::UseFallbackDatabase => use_fallback_database(link, cfg, edition).await,
            Workaround::CreateAlternateDatabase => {
                create_alternate_database(link, cfg, edition).await
            }
            Workaround::CommunityMode => community_mode(link, cfg, edition).await,
        };
        match outcome {
            Provision::Ready(p) => return Ok(p),
            Provision::Fatal(msg) => bail!("graph backend provisioning failed: {}", msg),
            Provision::Continue => continue,
        }
    }
    bail!(
        "no provisioning strategy succeeded. Check that the backend is \
         running on the configured bolt URI, verify credentials, or point \
         graph.database at an existing database."
    )
}

/// Workaround (a): reuse the pre-existing fallback database.
async fn use_fallback_database(
    link: &GraphClient,
    cfg: &GraphConfig,
    edition: Edition,
) -> Provision {
    info!(database = %cfg.fallback_database, "workaround: using fallback database");
    match round_trip(link).await {
        Ok(()) => {
            maybe_wipe(link, cfg, &cfg.fallback_database).await;
            Provision::Ready(Provisioned {
                database: cfg.fallback_database.clone(),
                used_fallback: true,
                edition,
            })
        }
        Err(err) => {
            warn!(error = %err, "fallback database round-trip failed");
            Provision::Continue
        }
    }
}

/// Workaround (b): create a database under an alternate name and tell the
/// operator to repoint downstream tooling.
async fn create_alternate_database(
    link: &GraphClient,
    cfg: &GraphConfig,
    edition: Edition,
) -> Provision {
    info!(database = %cfg.alternate_database, "workaround: creating alternate database");
    match link
        .execute(&format!("CREATE DATABASE {}", cfg.alternate_database))
        .await
    {
        Ok(_) => {
            warn!(
                database = %cfg.alternate_database,
                "created alternate database; downstream tooling must be \
                 reconfigured to target it"
            );
            Provision::Ready(Provisioned {
                database: cfg.alternate_database.clone(),
                used_fallback: true,
                edition,
            })
        }
        Err(err) => {
            let msg = format!("{:#}", err).to_lowercase();
            if msg.contains("already exists") {
                Provision::Ready(Provisioned {
                    database: cfg.alternate_database.clone(),
                    used_fallback: true,
                    edition,
                })
            } else {
                warn!(error = %err, "alternate database creation failed");
                Provision::Continue
            }
        }
    }
}

/// Workaround (c): community-edition mode — proceed on the single available
/// database.
async fn community_mode(link: &GraphClient, cfg: &GraphConfig, _edition: Edition) -> Provision {
    info!("workaround: community edition mode on the default database");
    match round_trip(link).await {
        Ok(()) => {
            maybe_wipe(link, cfg, &cfg.fallback_database).await;
            Provision::Ready(Provisioned {
                database: cfg.fallback_database.clone(),
                used_fallback: true,
                edition: Edition::Community,
            })
        }
        Err(err) => Provision::Fatal(format!("basic connection test failed: {:#}", err)),
    }
}

/// Verifies connectivity with a trivial round-trip query.
async fn round_trip(link: &GraphClient) -> Result<()> {
    let rows = link.execute("RETURN 1 AS test").await?;
    let ok = rows
        .first()
        .and_then(|row| row.get("test"))
        .and_then(|v| v.as_i64())
        == Some(1);
    if !ok {
        bail!("round-trip query returned an unexpected result");
    }
    Ok(())
}

/// Destructively clears the shared database — only when explicitly opted
/// in. Skipping is logged so the operator knows stale data may remain.
async fn maybe_wipe(link: &GraphClient, cfg: &GraphConfig, database: &str) {
    if !cfg.wipe_fallback_database {
        warn!(
            database,
            "skipping destructive wipe of shared database \
             (graph.wipe_fallback_database is off); pre-existing graph \
             content may conflict with this load"
        );
        return;
    }
    warn!(
        database,
        "clearing ALL existing content from shared database \
         (graph.wipe_fallback_database is on)"
    );
    match link.execute("MATCH (n) DETACH DELETE n").await {
        Ok(_) => info!(database, "database cleared"),
        Err(err) => warn!(error = %err, database, "failed to clear database"),
    }
}

/// Probes edition/version; a failed probe assumes the most restrictive tier.
async fn probe_edition(link: &GraphClient) -> Edition {
    let q = "CALL dbms.components() YIELD name, versions, edition \
             RETURN name, versions[0] AS version, edition";
    match link.execute(q).await {
        Ok(rows) => {
            for row in &rows {
                if row.get("name").and_then(|v| v.as_str()) == Some("Neo4j Kernel") {
                    let version = row.get("version").and_then(|v| v.as_str()).unwrap_or("?");
                    let edition = row.get("edition").and_then(|v| v.as_str()).unwrap_or("");
                    info!(version, edition, "backend version");
                    return parse_edition(edition);
                }
            }
            Edition::Unknown
        }
        Err(err) => {
            warn!(error = %err, "could not get version info; assuming community edition");
            Edition::Unknown
        }
    }
}

/// Lists the backend's databases; errors mean multi-database is unavailable.
async fn list_databases(link: &GraphClient) -> Result<Vec<String>> {
    let rows = link.execute("SHOW DATABASES").await?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get("name").and_then(|v| v.as_str()))
        .map(String::from)
        .collect())
}

/// Polls the database status after creation. "online" — or a status we
/// cannot read, as long as the listing itself succeeds — counts as up.
async fn database_is_online(link: &GraphClient, database: &str) -> bool {
    match link.execute("SHOW DATABASES").await {
        Ok(rows) => {
            for row in &rows {
                if row.get("name").and_then(|v| v.as_str()) == Some(database) {
                    let status = row
                        .get("currentStatus")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    info!(database, status, "database status");
                    return status == "online" || status == "unknown";
                }
            }
            // Created but not listed yet; trust the creation result.
            true
        }
        Err(_) => true,
    }
}

/// CREATE DATABASE quoting variants, tried in sequence.
fn quoting_variants(database: &str) -> [String; 4] {
    [
        format!("CREATE DATABASE `{}`", database),
        format!("CREATE DATABASE {}", database),
        format!("CREATE DATABASE '{}'", database),
        format!("CREATE DATABASE \"{}\"", database),
    ]
}

fn is_illegal_name(message: &str) -> bool {
    message.contains("illegal") && message.contains("character")
}

fn is_unsupported(message: &str) -> bool {
    message.contains("unsupported") || message.contains("community")
}

fn parse_edition(edition: &str) -> Edition {
    if edition.to_lowercase().contains("enterprise") {
        Edition::Enterprise
    } else {
        Edition::Community
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting_variants_cover_all_styles() {
        let variants = quoting_variants("satgraph_db");
        assert_eq!(variants.len(), 4);
        assert!(variants[0].contains("`satgraph_db`"));
        assert!(variants[1].ends_with("satgraph_db"));
        assert!(variants[2].contains("'satgraph_db'"));
        assert!(variants[3].contains("\"satgraph_db\""));
    }

    #[test]
    fn test_error_classification() {
        assert!(is_illegal_name("illegal character in database name"));
        assert!(!is_illegal_name("character study"));
        assert!(is_unsupported("unsupported administration command"));
        assert!(is_unsupported("not available in community edition"));
        assert!(!is_unsupported("connection refused"));
    }

    #[test]
    fn test_edition_display() {
        assert_eq!(Edition::Enterprise.to_string(), "enterprise");
        assert_eq!(Edition::Community.to_string(), "community");
        assert_eq!(Edition::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_parse_edition() {
        assert_eq!(parse_edition("enterprise"), Edition::Enterprise);
        assert_eq!(parse_edition("Enterprise"), Edition::Enterprise);
        assert_eq!(parse_edition("community"), Edition::Community);
        assert_eq!(parse_edition(""), Edition::Community);
    }

    #[test]
    fn test_workaround_order_is_fixed() {
        assert!(matches!(WORKAROUNDS[0], Workaround::UseFallbackDatabase));
        assert!(matches!(
            WORKAROUNDS[1],
            Workaround::CreateAlternateDatabase
        ));
        assert!(matches!(WORKAROUNDS[2], Workaround::CommunityMode));
    }
}
