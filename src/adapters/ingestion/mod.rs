//! Ingestion endpoint integration
//!
//! Canonical records leave the connector through an [`IngestionSink`]. The
//! production implementation is an HTTPS client that posts JSON batches.

pub mod client;
pub mod traits;

pub use client::IngestionClient;
pub use traits::IngestionSink;
