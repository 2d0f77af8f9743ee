//! S3-compatible object storage for ingested videos.
//!
//! This crate provides:
//! - File upload with content type
//! - Storage key derivation partitioned by aspect class
//! - Public URL construction under a distribution root
//! - Connectivity checks for readiness probes

pub mod client;
pub mod error;
pub mod keys;

pub use client::{ObjectStoreClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use keys::{object_key, object_key_from_bytes, public_url};
