//! Object store client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::keys;

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Endpoint URL of the S3-compatible API (`S3_ENDPOINT_URL`).
    pub endpoint_url: String,
    /// Static access key id (`S3_ACCESS_KEY_ID`).
    pub access_key_id: String,
    /// Static secret key (`S3_SECRET_ACCESS_KEY`).
    pub secret_access_key: String,
    /// Bucket all objects are written into (`S3_BUCKET_NAME`).
    pub bucket_name: String,
    /// Region, `"auto"` for R2-style providers (`S3_REGION`).
    pub region: String,
    /// Public URL prefix under which stored objects are reachable (`S3_DISTRIBUTION_ROOT`).
    pub distribution_root: String,
}

fn require(name: &str) -> StorageResult<String> {
    std::env::var(name).map_err(|_| StorageError::config_error(format!("{} not set", name)))
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: require("S3_ENDPOINT_URL")?,
            access_key_id: require("S3_ACCESS_KEY_ID")?,
            secret_access_key: require("S3_SECRET_ACCESS_KEY")?,
            bucket_name: require("S3_BUCKET_NAME")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
            distribution_root: require("S3_DISTRIBUTION_ROOT")?,
        })
    }
}

/// S3-compatible object store client.
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: Client,
    bucket: String,
    distribution_root: String,
}

impl ObjectStoreClient {
    /// Create a new client from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        // Static credentials; R2-style providers have no instance metadata
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "viddock",
        );

        let s3_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket_name,
            distribution_root: config.distribution_root,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env()?).await
    }

    /// Upload a local file under the given key.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), key, "Uploading object");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(path = %path.display(), key, "Uploaded object");
        Ok(())
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, key: &str) -> String {
        keys::public_url(&self.distribution_root, key)
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::S3Api(format!("Storage connectivity check failed: {}", e)))?;
        Ok(())
    }

    /// Bucket this client writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}
