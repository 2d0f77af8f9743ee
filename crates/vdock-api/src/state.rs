//! Application state.

use std::sync::Arc;

use tracing::info;

use vdock_firestore::{FirestoreClient, VideoRepo};
use vdock_storage::ObjectStoreClient;

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::services::ingest::{
    FaststartNormalizer, FfprobeInspector, FirestoreVideoStore, IngestConfig, IngestService,
    ObjectStore, S3ObjectStore, VideoStore,
};
use crate::services::AssetStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub verifier: Arc<TokenVerifier>,
    pub ingest: Arc<IngestService>,
    pub videos: Arc<dyn VideoStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub assets: Arc<AssetStore>,
}

impl AppState {
    /// Create new application state wired to the real backends.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if config.jwt_secret.is_empty() {
            return Err("JWT_SECRET must be set".into());
        }

        let storage = ObjectStoreClient::from_env().await?;
        let firestore = FirestoreClient::from_env().await?;
        info!(
            project_id = %firestore.project_id(),
            bucket = %storage.bucket(),
            "connected to backends"
        );

        let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(storage));
        let videos: Arc<dyn VideoStore> =
            Arc::new(FirestoreVideoStore::new(VideoRepo::new(firestore)));

        let ingest = Arc::new(IngestService::new(
            Arc::new(FfprobeInspector::new(config.probe_timeout_secs)),
            Arc::new(FaststartNormalizer::new(config.remux_timeout_secs)),
            Arc::clone(&objects),
            Arc::clone(&videos),
            IngestConfig::from_api(&config),
        ));

        let assets = Arc::new(AssetStore::new(
            config.assets_dir.clone(),
            config.public_base_url.clone(),
        ));
        assets.ensure_root().await?;

        let verifier = Arc::new(TokenVerifier::new(&config.jwt_secret));

        Ok(Self {
            config,
            verifier,
            ingest,
            videos,
            objects,
            assets,
        })
    }
}
