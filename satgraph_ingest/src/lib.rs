//! # Satgraph Ingest
//!
//! Batch orchestration for the satgraph ingestion pipeline.
//!
//! This crate drives the full load: bootstrap the graph backend, route each
//! dataset to its normalizer, submit one episode per record with per-record
//! fault isolation, and report aggregate statistics. A malformed record
//! never aborts its dataset; a broken dataset never aborts the batch; only
//! a failed bootstrap aborts the run.
//!
//! The orchestrator is generic over [`GraphStore`](satgraph_core::GraphStore),
//! so tests drive it with in-memory mock stores and the loader binary wires
//! in the bolt-backed client.

pub mod loader;

pub use loader::{
    load_all, load_one, DatasetRecord, DatasetStatus, GraphLoader, GraphStats, LoadReport,
};
