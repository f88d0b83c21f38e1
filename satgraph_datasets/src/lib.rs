//! Satgraph Datasets — dataset routing and record normalization.
//!
//! This crate maps the fixed set of scraped portal datasets to their JSON
//! files and turns raw, failure-prone records into canonical
//! [`Episode`](satgraph_core::Episode)s ready for graph ingestion.
//!
//! # Modules
//!
//! - [`dataset`]: The [`Dataset`](dataset::Dataset) router and load errors
//! - [`satellites`]: Satellite mission records
//! - [`products`]: Data product catalog records
//! - [`documents`]: Documentation metadata records
//! - [`missions`]: Mission technical metadata records
//! - [`faqs`]: FAQ records
//!
//! Normalizers are pure total functions: any JSON object normalizes without
//! error, missing fields fall back to documented defaults, and the input is
//! never mutated.

pub mod dataset;
pub mod documents;
pub mod faqs;
pub mod missions;
pub mod products;
pub mod satellites;

pub use dataset::{Dataset, DatasetError};
pub use documents::Documentation;
pub use faqs::Faq;
pub use missions::MissionMetadata;
pub use products::DataProduct;
pub use satellites::SatelliteMission;
