//! Firestore-backed metadata store for VidDock.
//!
//! Talks to the Firestore REST API directly over `reqwest` with cached
//! service-account tokens. Video records live in a root-level `videos`
//! collection keyed by video id, with ownership tracked in a `user_id`
//! field.

pub mod client;
pub mod error;
pub mod metrics;
pub mod token_cache;
pub mod types;
pub mod videos;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use videos::{VideoRepo, VIDEOS_COLLECTION};
