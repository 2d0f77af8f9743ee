//! Axum HTTP API server for VidDock.
//!
//! This crate provides:
//! - The video ingestion pipeline (spool, probe, remux, upload, record)
//! - Video record CRUD and thumbnail upload
//! - Bearer JWT authentication
//! - Prometheus metrics and health/readiness probes

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{AssetStore, IngestService};
pub use state::AppState;
