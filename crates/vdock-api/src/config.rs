//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Secret for HS256 bearer token verification
    pub jwt_secret: String,
    /// Directory for locally served assets (thumbnails)
    pub assets_dir: PathBuf,
    /// Base URL under which this server is reachable
    pub public_base_url: String,
    /// Timeout for spooling an upload body to disk
    pub spool_timeout: Duration,
    /// Timeout for the ffprobe subprocess
    pub probe_timeout_secs: u64,
    /// Timeout for the ffmpeg remux subprocess
    pub remux_timeout_secs: u64,
    /// Timeout for the object store upload
    pub upload_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1 << 30, // 1GB, uploads are whole videos
            environment: "development".to_string(),
            jwt_secret: String::new(),
            assets_dir: PathBuf::from("./assets"),
            public_base_url: "http://localhost:8091".to_string(),
            spool_timeout: Duration::from_secs(300),
            probe_timeout_secs: 60,
            remux_timeout_secs: 300,
            upload_timeout: Duration::from_secs(300),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| defaults.public_base_url.clone());
        if url::Url::parse(&public_base_url).is_err() {
            warn!(url = %public_base_url, "PUBLIC_BASE_URL does not parse as a URL");
        }

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            assets_dir: std::env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            public_base_url,
            spool_timeout: Duration::from_secs(
                std::env::var("SPOOL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.spool_timeout.as_secs()),
            ),
            probe_timeout_secs: std::env::var("PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.probe_timeout_secs),
            remux_timeout_secs: std::env::var("REMUX_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.remux_timeout_secs),
            upload_timeout: Duration::from_secs(
                std::env::var("UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.upload_timeout.as_secs()),
            ),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
