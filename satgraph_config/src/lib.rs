//! # Satgraph Config
//!
//! Configuration system for the satgraph ingestion pipeline.
//!
//! Provides TOML-based configuration parsing and validation for the graph
//! backend connection, dataset locations, and loader behavior.
//!
//! # Configuration Schema
//!
//! The configuration file (`satgraph.toml`) supports the following sections:
//! - `[graph]` — graph backend connection (uri, user, password, databases)
//! - `[data]` — dataset file locations
//! - `[loader]` — loader behavior (log level, search result limit)
//!
//! # Environment Variable Overrides
//!
//! Every config field can be overridden via environment variables using the
//! `SATGRAPH_` prefix and `_` as section separator:
//! - `SATGRAPH_GRAPH_URI` → `graph.uri`
//! - `SATGRAPH_GRAPH_USER` → `graph.user`
//! - `SATGRAPH_GRAPH_PASSWORD` → `graph.password`
//! - `SATGRAPH_GRAPH_DATABASE` → `graph.database`
//! - `SATGRAPH_DATA_DIR` → `data.data_dir`
//! - `SATGRAPH_LOADER_LOG_LEVEL` → `loader.log_level`
//!
//! The portal-era variables `NEO4J_URI`, `NEO4J_USER`, and `NEO4J_PASSWORD`
//! are honored as aliases when the `SATGRAPH_*` variable is unset.

use serde::{Deserialize, Serialize};

/// Top-level satgraph configuration.
///
/// Parsed from `satgraph.toml` or constructed programmatically, then passed
/// by value into the loader — no ambient process-wide state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatgraphConfig {
    /// Graph backend connection settings.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Dataset file locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Loader behavior.
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Graph backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Bolt URI of the graph backend (default: "bolt://localhost:7687").
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Username (default: "neo4j").
    #[serde(default = "default_user")]
    pub user: String,
    /// Password (default: "password").
    #[serde(default = "default_password")]
    pub password: String,
    /// The isolated database the loader writes into (default: "satgraph_db").
    /// Created during bootstrap when the backend edition allows it.
    #[serde(default = "default_database")]
    pub database: String,
    /// Pre-existing database used when the isolated database cannot be
    /// created (default: "neo4j").
    #[serde(default = "default_fallback_database")]
    pub fallback_database: String,
    /// Alternate database name attempted when the preferred name is rejected
    /// (default: "satgraph"). Downstream tooling must be repointed at it.
    #[serde(default = "default_alternate_database")]
    pub alternate_database: String,
    /// Whether fallback provisioning may destructively clear all existing
    /// content of the fallback database (default: false). The wipe removes
    /// every node and relationship in that database; leave this off unless
    /// the database is dedicated to satgraph.
    #[serde(default)]
    pub wipe_fallback_database: bool,
    /// Seconds to wait after creating a database before polling its status
    /// (default: 3).
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            fallback_database: default_fallback_database(),
            alternate_database: default_alternate_database(),
            wipe_fallback_database: false,
            settle_secs: default_settle_secs(),
        }
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}
fn default_user() -> String {
    "neo4j".to_string()
}
fn default_password() -> String {
    "password".to_string()
}
fn default_database() -> String {
    "satgraph_db".to_string()
}
fn default_fallback_database() -> String {
    "neo4j".to_string()
}
fn default_alternate_database() -> String {
    "satgraph".to_string()
}
fn default_settle_secs() -> u64 {
    3
}

/// Dataset file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing the scraped dataset JSON files (default: "data").
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// Loader behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Log level (default: "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum number of facts returned by a search (default: 20).
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_search_limit() -> usize {
    20
}

impl SatgraphConfig {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::parse_toml(&contents)
    }

    /// Parse configuration from a TOML string, apply env overrides, then
    /// validate.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        let mut config: SatgraphConfig = toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// `SATGRAPH_*` variables win; the legacy `NEO4J_URI` / `NEO4J_USER` /
    /// `NEO4J_PASSWORD` aliases apply only when the `SATGRAPH_*` variable
    /// is unset.
    pub fn apply_env_overrides(&mut self) {
        // Graph overrides (legacy aliases first so SATGRAPH_* wins).
        if let Ok(v) = std::env::var("NEO4J_URI") {
            self.graph.uri = v;
        }
        if let Ok(v) = std::env::var("NEO4J_USER") {
            self.graph.user = v;
        }
        if let Ok(v) = std::env::var("NEO4J_PASSWORD") {
            self.graph.password = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_URI") {
            self.graph.uri = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_USER") {
            self.graph.user = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_PASSWORD") {
            self.graph.password = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_DATABASE") {
            self.graph.database = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_FALLBACK_DATABASE") {
            self.graph.fallback_database = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_ALTERNATE_DATABASE") {
            self.graph.alternate_database = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_WIPE_FALLBACK_DATABASE") {
            if let Ok(b) = v.parse::<bool>() {
                self.graph.wipe_fallback_database = b;
            }
        }
        if let Ok(v) = std::env::var("SATGRAPH_GRAPH_SETTLE_SECS") {
            if let Ok(s) = v.parse::<u64>() {
                self.graph.settle_secs = s;
            }
        }

        // Data overrides
        if let Ok(v) = std::env::var("SATGRAPH_DATA_DIR") {
            self.data.data_dir = v;
        }

        // Loader overrides
        if let Ok(v) = std::env::var("SATGRAPH_LOADER_LOG_LEVEL") {
            self.loader.log_level = v;
        }
        if let Ok(v) = std::env::var("SATGRAPH_LOADER_SEARCH_LIMIT") {
            if let Ok(n) = v.parse::<usize>() {
                self.loader.search_limit = n;
            }
        }
    }

    /// Validate configuration values with detailed error messages.
    pub fn validate(&self) -> anyhow::Result<()> {
        // --- Graph validation ---
        let valid_schemes = ["bolt://", "bolt+s://", "neo4j://", "neo4j+s://"];
        if !valid_schemes.iter().any(|s| self.graph.uri.starts_with(s)) {
            anyhow::bail!(
                "graph.uri must start with one of: {} (got '{}'). Set via satgraph.toml or SATGRAPH_GRAPH_URI env var.",
                valid_schemes.join(", "),
                self.graph.uri
            );
        }
        if self.graph.user.is_empty() {
            anyhow::bail!("graph.user must not be empty.");
        }
        if self.graph.database.is_empty() {
            anyhow::bail!("graph.database must not be empty.");
        }
        if self.graph.fallback_database.is_empty() {
            anyhow::bail!("graph.fallback_database must not be empty.");
        }
        if self.graph.alternate_database == self.graph.database {
            anyhow::bail!(
                "graph.alternate_database must differ from graph.database (both are '{}').",
                self.graph.database
            );
        }
        if self.graph.settle_secs > 60 {
            anyhow::bail!(
                "graph.settle_secs must be <= 60 (got {}).",
                self.graph.settle_secs
            );
        }

        // --- Data validation ---
        if self.data.data_dir.is_empty() {
            anyhow::bail!("data.data_dir must not be empty.");
        }

        // --- Loader validation ---
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.loader.log_level.as_str()) {
            anyhow::bail!(
                "loader.log_level must be one of: {} (got '{}').",
                valid_log_levels.join(", "),
                self.loader.log_level
            );
        }
        if self.loader.search_limit == 0 {
            anyhow::bail!("loader.search_limit must be > 0.");
        }

        Ok(())
    }

    /// Example configuration file with inline documentation, for `--init-config`.
    pub fn example_toml() -> &'static str {
        r#"# satgraph configuration
#
# Every value below can be overridden via environment variables using the
# SATGRAPH_ prefix, e.g. SATGRAPH_GRAPH_URI, SATGRAPH_DATA_DIR.
# NEO4J_URI / NEO4J_USER / NEO4J_PASSWORD are honored as aliases.

[graph]
# Bolt URI of the graph backend.
uri = "bolt://localhost:7687"
user = "neo4j"
password = "password"
# Isolated database the loader writes into. Created during bootstrap when
# the backend edition supports multi-database.
database = "satgraph_db"
# Pre-existing database used when the isolated one cannot be created.
fallback_database = "neo4j"
# Alternate name attempted when the preferred name is rejected.
alternate_database = "satgraph"
# Allow fallback provisioning to destructively clear the fallback database.
# This deletes every node and relationship in it. Off by default.
wipe_fallback_database = false
# Seconds to wait after creating a database before polling its status.
settle_secs = 3

[data]
# Directory containing satellites.json, products.json, documents.json,
# mission_metadata.json and faqs.json.
data_dir = "data"

[loader]
# Log level: trace, debug, info, warn, error.
log_level = "info"
# Maximum number of facts returned by `satgraph-loader search`.
search_limit = 20
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests that read or write process environment serialize on this lock,
    // since apply_env_overrides is sensitive to concurrent set_var calls.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn test_default_connection_parameters() {
        let config = SatgraphConfig::default();
        assert_eq!(config.graph.uri, "bolt://localhost:7687");
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.graph.password, "password");
        assert_eq!(config.graph.database, "satgraph_db");
        assert_eq!(config.graph.fallback_database, "neo4j");
        assert!(!config.graph.wipe_fallback_database);
        assert_eq!(config.data.data_dir, "data");
        assert_eq!(config.loader.log_level, "info");
    }

    #[test]
    fn test_parse_toml_partial_sections() {
        let _guard = ENV_LOCK.lock().unwrap();
        let toml_str = r#"
            [graph]
            uri = "bolt://graph.example.org:7687"
            database = "portal_db"

            [loader]
            log_level = "debug"
        "#;
        let config = SatgraphConfig::parse_toml(toml_str).unwrap();
        assert_eq!(config.graph.uri, "bolt://graph.example.org:7687");
        assert_eq!(config.graph.database, "portal_db");
        // Unspecified fields keep their defaults.
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.loader.log_level, "debug");
        assert_eq!(config.loader.search_limit, 20);
    }

    #[test]
    fn test_validate_rejects_bad_uri_scheme() {
        let mut config = SatgraphConfig::default();
        config.graph.uri = "http://localhost:7474".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("graph.uri"), "unexpected error: {err}");
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = SatgraphConfig::default();
        config.loader.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_alternate_equal_to_database() {
        let mut config = SatgraphConfig::default();
        config.graph.alternate_database = config.graph.database.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_toml_parses_and_validates() {
        let config: SatgraphConfig = toml::from_str(SatgraphConfig::example_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.graph.database, "satgraph_db");
    }

    #[test]
    fn test_env_override_precedence() {
        let _guard = ENV_LOCK.lock().unwrap();
        // SATGRAPH_* must win over the legacy NEO4J_* alias.
        std::env::set_var("NEO4J_URI", "bolt://alias:7687");
        std::env::set_var("SATGRAPH_GRAPH_URI", "bolt://primary:7687");
        let mut config = SatgraphConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.graph.uri, "bolt://primary:7687");
        std::env::remove_var("NEO4J_URI");
        std::env::remove_var("SATGRAPH_GRAPH_URI");
    }
}
