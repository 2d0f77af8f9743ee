//! Shared data models for VidDock.
//!
//! This crate provides Serde-serializable types shared by the API,
//! storage, and metadata layers:
//! - Video records and identifiers
//! - Aspect-ratio classification

pub mod aspect;
pub mod video;

// Re-export common types
pub use aspect::AspectClass;
pub use video::{Video, VideoId};
