//! Batch load orchestration with per-record fault isolation.
//!
//! The run proceeds through a fixed sequence of states: bootstrap, then one
//! dataset at a time in fixed order (each `Pending → InProgress → Loaded |
//! Failed`), then best-effort statistics. Failures are recovered at the
//! narrowest scope that preserves forward progress — record, then dataset,
//! then run — and outcomes are collected rather than thrown.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use satgraph_core::GraphStore;
use satgraph_datasets::Dataset;

/// Lifecycle of one dataset within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetStatus {
    /// Not reached yet (or never reached, when bootstrap failed).
    Pending,
    /// Currently loading.
    InProgress,
    /// File found, parsed, and the record loop completed.
    Loaded,
    /// Dataset-level failure; the batch continued without it.
    Failed { error: String },
}

/// Outcome of one dataset load.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    /// The dataset this record describes.
    pub dataset: Dataset,
    /// Final (or current) status.
    pub status: DatasetStatus,
    /// Episodes successfully submitted to the graph.
    pub episodes_submitted: usize,
    /// Records skipped after a record-level failure.
    pub episodes_failed: usize,
    /// Wall-clock milliseconds spent on this dataset.
    pub elapsed_ms: u64,
}

impl DatasetRecord {
    fn pending(dataset: Dataset) -> Self {
        Self {
            dataset,
            status: DatasetStatus::Pending,
            episodes_submitted: 0,
            episodes_failed: 0,
            elapsed_ms: 0,
        }
    }
}

/// Aggregate node/relationship counts reported after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    /// Total nodes in the target database.
    pub nodes: i64,
    /// Total relationships in the target database.
    pub relationships: i64,
}

/// Final report of a run.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Why bootstrap failed, when it did. A set value means no dataset was
    /// attempted and no dataset file was read.
    pub bootstrap_error: Option<String>,
    /// Per-dataset outcomes, in load order.
    pub datasets: Vec<DatasetRecord>,
    /// Aggregate graph statistics; `None` when the stats query failed
    /// (cosmetic — never affects the load outcome).
    pub stats: Option<GraphStats>,
    /// Wall-clock milliseconds for the whole run.
    pub total_ms: u64,
}

impl LoadReport {
    fn new(datasets: &[Dataset]) -> Self {
        Self {
            bootstrap_error: None,
            datasets: datasets.iter().copied().map(DatasetRecord::pending).collect(),
            stats: None,
            total_ms: 0,
        }
    }

    /// Whether the run aborted before any dataset load.
    pub fn bootstrap_failed(&self) -> bool {
        self.bootstrap_error.is_some()
    }

    /// Number of datasets the run attempted to load.
    pub fn attempted(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| d.status != DatasetStatus::Pending)
            .count()
    }

    /// Number of datasets fully loaded.
    pub fn loaded(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| d.status == DatasetStatus::Loaded)
            .count()
    }

    /// Total episodes submitted across all datasets.
    pub fn episodes_submitted(&self) -> usize {
        self.datasets.iter().map(|d| d.episodes_submitted).sum()
    }

    /// Total records skipped across all datasets.
    pub fn episodes_failed(&self) -> usize {
        self.datasets.iter().map(|d| d.episodes_failed).sum()
    }

    /// One-line human summary of the run.
    pub fn summary(&self) -> String {
        if let Some(err) = &self.bootstrap_error {
            return format!("bootstrap failed, no datasets loaded: {}", err);
        }
        let mut line = format!(
            "loaded {}/{} datasets ({} episodes submitted, {} records skipped)",
            self.loaded(),
            self.datasets.len(),
            self.episodes_submitted(),
            self.episodes_failed(),
        );
        if let Some(stats) = &self.stats {
            line.push_str(&format!(
                "; graph now holds {} nodes and {} relationships",
                stats.nodes, stats.relationships
            ));
        }
        line
    }
}

/// Sequential episode loader bound to one graph store.
///
/// All episodes of one loader share a single reference time, captured at
/// construction, so a whole load is temporally coherent in the graph's
/// bi-temporal model.
pub struct GraphLoader<S: GraphStore> {
    store: S,
    data_dir: PathBuf,
    reference_time: DateTime<Utc>,
}

impl<S: GraphStore> GraphLoader<S> {
    /// Creates a loader over an already-bootstrapped store.
    pub fn new(store: S, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            reference_time: Utc::now(),
        }
    }

    /// The run's shared reference time.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Loads one dataset: route, normalize each record, submit each episode.
    ///
    /// Record-level failures are logged with the record's identity and do
    /// not abort the loop. Dataset-level failures (missing, unreadable,
    /// empty) mark the dataset failed and return.
    pub async fn load_dataset(&self, dataset: Dataset) -> DatasetRecord {
        let started = Instant::now();
        let mut record = DatasetRecord::pending(dataset);
        record.status = DatasetStatus::InProgress;

        let records = match dataset.read_records(&self.data_dir) {
            Ok(records) => records,
            Err(err) => {
                if err.is_empty() {
                    warn!(%dataset, "{}", err);
                } else {
                    warn!(%dataset, error = %err, "dataset failed to load");
                }
                record.status = DatasetStatus::Failed {
                    error: err.to_string(),
                };
                record.elapsed_ms = started.elapsed().as_millis() as u64;
                return record;
            }
        };

        info!(%dataset, records = records.len(), "loading dataset");
        let total = records.len();
        for (i, raw) in records.iter().enumerate() {
            if !raw.is_object() {
                warn!(
                    %dataset,
                    record = i + 1,
                    "skipping malformed record (not a JSON object)"
                );
                record.episodes_failed += 1;
                continue;
            }
            let identity = dataset.record_identity(raw);
            debug!("[{}/{}] adding: {}", i + 1, total, identity);
            let episode = dataset.episode(raw, self.reference_time);
            match self.store.add_episode(&episode).await {
                Ok(()) => record.episodes_submitted += 1,
                Err(err) => {
                    warn!(
                        %dataset,
                        record = %identity,
                        error = %format!("{:#}", err),
                        "failed to ingest record; continuing"
                    );
                    record.episodes_failed += 1;
                }
            }
        }

        record.status = DatasetStatus::Loaded;
        record.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %dataset,
            submitted = record.episodes_submitted,
            skipped = record.episodes_failed,
            elapsed_ms = record.elapsed_ms,
            "dataset loaded"
        );
        record
    }

    /// Queries aggregate node and relationship counts.
    pub async fn fetch_stats(&self) -> Result<GraphStats> {
        let nodes = self
            .count_query("MATCH (n) RETURN count(n) AS count")
            .await
            .context("node count query failed")?;
        let relationships = self
            .count_query("MATCH ()-[r]-() RETURN count(r) AS count")
            .await
            .context("relationship count query failed")?;
        Ok(GraphStats {
            nodes,
            relationships,
        })
    }

    async fn count_query(&self, query: &str) -> Result<i64> {
        let rows = self.store.execute(query).await?;
        rows.first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_i64())
            .context("count query returned no usable row")
    }

    /// Releases the underlying store. Close errors are logged, not raised.
    pub async fn close(self) {
        if let Err(err) = self.store.close().await {
            warn!(error = %format!("{:#}", err), "error closing graph store");
        }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Runs the full batch: bootstrap, all five datasets in fixed order, stats.
///
/// `connect` performs the backend bootstrap (capability negotiation plus
/// index bootstrap) and yields a ready store. When it fails, the run aborts:
/// the report carries the bootstrap error, zero datasets are attempted, and
/// no dataset file is read.
pub async fn load_all<S, F, Fut>(data_dir: &Path, connect: F) -> LoadReport
where
    S: GraphStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    run(data_dir, &Dataset::ALL, connect).await
}

/// Runs the batch for a single dataset through the same bootstrap path.
pub async fn load_one<S, F, Fut>(data_dir: &Path, dataset: Dataset, connect: F) -> LoadReport
where
    S: GraphStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    run(data_dir, &[dataset], connect).await
}

async fn run<S, F, Fut>(data_dir: &Path, datasets: &[Dataset], connect: F) -> LoadReport
where
    S: GraphStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let started = Instant::now();
    let mut report = LoadReport::new(datasets);

    info!("bootstrapping graph backend");
    let store = match connect().await {
        Ok(store) => store,
        Err(err) => {
            let message = format!("{:#}", err);
            error!(error = %message, "bootstrap failed; aborting run");
            report.bootstrap_error = Some(message);
            report.total_ms = started.elapsed().as_millis() as u64;
            return report;
        }
    };

    let loader = GraphLoader::new(store, data_dir);
    info!(
        reference_time = %loader.reference_time(),
        "bootstrap complete; starting dataset loads"
    );

    for slot in report.datasets.iter_mut() {
        *slot = loader.load_dataset(slot.dataset).await;
    }

    // Best-effort statistics: a failure here is cosmetic and must not
    // change the datasets-loaded outcome.
    match loader.fetch_stats().await {
        Ok(stats) => {
            info!(
                nodes = stats.nodes,
                relationships = stats.relationships,
                "knowledge graph statistics"
            );
            report.stats = Some(stats);
        }
        Err(err) => {
            warn!(error = %format!("{:#}", err), "could not retrieve statistics");
        }
    }

    loader.close().await;
    report.total_ms = started.elapsed().as_millis() as u64;
    info!(
        loaded = report.loaded(),
        attempted = report.attempted(),
        total_ms = report.total_ms,
        "load complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_only_non_pending_as_attempted() {
        let mut report = LoadReport::new(&Dataset::ALL);
        assert_eq!(report.attempted(), 0);
        report.datasets[0].status = DatasetStatus::Loaded;
        report.datasets[1].status = DatasetStatus::Failed {
            error: "missing".into(),
        };
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.loaded(), 1);
    }

    #[test]
    fn test_summary_mentions_bootstrap_failure() {
        let mut report = LoadReport::new(&Dataset::ALL);
        report.bootstrap_error = Some("connection refused".into());
        let summary = report.summary();
        assert!(summary.contains("no datasets loaded"));
        assert!(summary.contains("connection refused"));
    }

    #[test]
    fn test_summary_includes_stats_when_present() {
        let mut report = LoadReport::new(&Dataset::ALL);
        report.stats = Some(GraphStats {
            nodes: 42,
            relationships: 17,
        });
        let summary = report.summary();
        assert!(summary.contains("42 nodes"));
        assert!(summary.contains("17 relationships"));
    }

    #[test]
    fn test_episode_totals_sum_across_datasets() {
        let mut report = LoadReport::new(&Dataset::ALL);
        report.datasets[0].episodes_submitted = 3;
        report.datasets[2].episodes_submitted = 2;
        report.datasets[2].episodes_failed = 1;
        assert_eq!(report.episodes_submitted(), 5);
        assert_eq!(report.episodes_failed(), 1);
    }
}
