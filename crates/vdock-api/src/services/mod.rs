//! Business logic services.

pub mod assets;
pub mod ingest;

pub use assets::AssetStore;
pub use ingest::{IngestConfig, IngestService};
