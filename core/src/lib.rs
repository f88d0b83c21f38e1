//! # Satgraph Core
//!
//! Core types and traits for the satgraph ingestion pipeline.
//!
//! This crate defines the shared abstractions that graph-store implementations
//! must conform to, as well as the [`Episode`](episode::Episode) data model —
//! the atomic unit written to the temporal knowledge graph.
//!
//! The [`store`] module defines the pluggable [`GraphStore`](store::GraphStore)
//! trait that decouples the ingestion pipeline from the concrete graph backend,
//! enabling backend selection via configuration and mock stores in tests.

pub mod episode;
pub mod store;

pub use episode::{Episode, EpisodeSource};
pub use store::{FactResult, GraphStore};
