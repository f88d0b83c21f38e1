//! # Satgraph Loader
//!
//! CLI for loading scraped satellite-portal datasets into a temporal
//! knowledge graph and querying it back.
//!
//! Provides subcommands for the pipeline's entry points:
//! - `load`: bootstrap the backend and ingest all five datasets (or one)
//! - `stats`: report aggregate node/relationship counts
//! - `search`: free-text search over extracted facts
//!
//! # Configuration
//!
//! Set `SATGRAPH_CONFIG` to a TOML config file path, or use defaults.
//! Connection parameters can also come from `SATGRAPH_GRAPH_*` (or the
//! legacy `NEO4J_*`) environment variables.
//!
//! # Usage
//!
//! ```bash
//! # Load every dataset from ./data
//! satgraph_loader load
//!
//! # Load a single dataset from a custom directory
//! satgraph_loader load --dataset faqs --data-dir /srv/scraped
//!
//! # Generate an example config file
//! satgraph_loader --init-config > satgraph.toml
//!
//! # Query the graph
//! satgraph_loader search "INSAT-3D sensors"
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use satgraph_config::SatgraphConfig;
use satgraph_core::GraphStore;
use satgraph_datasets::Dataset;
use satgraph_ingest::{load_all, load_one, DatasetStatus, GraphLoader, LoadReport};
use satgraph_neo4j::{bootstrap, GraphClient};

/// Satgraph knowledge-graph loader.
#[derive(Parser)]
#[command(name = "satgraph_loader")]
#[command(about = "Load scraped satellite-portal datasets into a temporal knowledge graph")]
#[command(version)]
struct Cli {
    /// Path to satgraph.toml config file.
    /// Can also be set via SATGRAPH_CONFIG env var.
    #[arg(short, long, env = "SATGRAPH_CONFIG", global = true)]
    config: Option<String>,

    /// Generate an example satgraph.toml config file and exit.
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the backend and load datasets into the knowledge graph.
    Load {
        /// Load a single dataset instead of all five:
        /// satellites, products, documents, mission_metadata, faqs.
        #[arg(long)]
        dataset: Option<String>,

        /// Override the data directory from the config.
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Report aggregate node and relationship counts.
    Stats,

    /// Free-text search over extracted facts.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of facts to return (default from config).
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle --init-config: print example config and exit.
    if cli.init_config {
        print!("{}", SatgraphConfig::example_toml());
        return Ok(());
    }

    // Load configuration from file or defaults, then apply env overrides.
    // Config must be loaded before logging so the log level is honored.
    let config = match &cli.config {
        Some(path) => SatgraphConfig::from_file(path)?,
        None => {
            let mut cfg = SatgraphConfig::default();
            cfg.apply_env_overrides();
            cfg.validate()?;
            cfg
        }
    };
    init_logging(&config);

    let command = cli.command.unwrap_or(Commands::Load {
        dataset: None,
        data_dir: None,
    });
    match command {
        Commands::Load { dataset, data_dir } => run_load(&config, dataset, data_dir).await,
        Commands::Stats => run_stats(&config).await,
        Commands::Search { query, limit } => run_search(&config, &query, limit).await,
    }
}

fn init_logging(config: &SatgraphConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.loader.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_load(
    config: &SatgraphConfig,
    dataset: Option<String>,
    data_dir: Option<String>,
) -> Result<()> {
    let data_dir = PathBuf::from(data_dir.unwrap_or_else(|| config.data.data_dir.clone()));
    let graph_config = config.graph.clone();
    let connect = move || async move { bootstrap(&graph_config).await };

    // The load future owns the bolt client; dropping it on interruption
    // tears the connection pool down, so Ctrl-C still releases the backend.
    let load = async {
        match dataset {
            Some(name) => {
                let dataset: Dataset = name.parse()?;
                Ok::<_, anyhow::Error>(load_one(&data_dir, dataset, connect).await)
            }
            None => Ok(load_all(&data_dir, connect).await),
        }
    };
    let report = tokio::select! {
        report = load => report?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted; closing graph connections");
            return Ok(());
        }
    };

    print_report(&report);
    if report.bootstrap_failed() {
        anyhow::bail!("load aborted: {}", report.summary());
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!();
    for record in &report.datasets {
        let status = match &record.status {
            DatasetStatus::Loaded => "loaded".to_string(),
            DatasetStatus::Failed { error } => format!("failed ({})", error),
            DatasetStatus::Pending => "skipped".to_string(),
            DatasetStatus::InProgress => "interrupted".to_string(),
        };
        println!(
            "  {:<17} {:>5} episodes, {:>3} skipped — {}",
            record.dataset.name(),
            record.episodes_submitted,
            record.episodes_failed,
            status
        );
    }
    println!();
    println!("{}", report.summary());
}

async fn run_stats(config: &SatgraphConfig) -> Result<()> {
    let client = connect_for_reads(config).await?;
    let loader = GraphLoader::new(client, &config.data.data_dir);
    let stats = loader.fetch_stats().await?;
    println!("Knowledge graph statistics:");
    println!("  nodes:         {}", stats.nodes);
    println!("  relationships: {}", stats.relationships);
    loader.close().await;
    Ok(())
}

async fn run_search(config: &SatgraphConfig, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.loader.search_limit);
    let client = connect_for_reads(config).await?;
    let facts = client.search(query, limit).await?;
    if facts.is_empty() {
        println!("No facts matched '{}'.", query);
    } else {
        for fact in &facts {
            let validity = match (&fact.valid_at, &fact.invalid_at) {
                (Some(from), Some(to)) => format!(" (valid {} – {})", from, to),
                (Some(from), None) => format!(" (valid since {})", from),
                _ => String::new(),
            };
            println!("- {}{}", fact.fact, validity);
        }
        println!();
        println!("{} fact(s) for '{}'.", facts.len(), query);
    }
    client.close().await.ok();
    Ok(())
}

/// Read-only connection: prefer the isolated database, fall back to the
/// shared one so `stats`/`search` still work after a fallback-tier load.
async fn connect_for_reads(config: &SatgraphConfig) -> Result<GraphClient> {
    match GraphClient::connect(&config.graph, &config.graph.database).await {
        Ok(client) => Ok(client),
        Err(err) => {
            tracing::warn!(
                database = %config.graph.database,
                error = %format!("{:#}", err),
                "could not use isolated database; trying fallback"
            );
            GraphClient::connect(&config.graph, &config.graph.fallback_database).await
        }
    }
}
