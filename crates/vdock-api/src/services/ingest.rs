//! Video ingestion pipeline.
//!
//! Takes an authenticated multipart upload from spooled bytes to a
//! public URL on the record: spool to a temp file, probe dimensions,
//! classify aspect, remux for streaming start, upload to the object
//! store, patch the record. Every step that can fail maps to exactly
//! one [`IngestError`] variant, and every temp file is removed on
//! every exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use vdock_firestore::{FirestoreError, VideoRepo};
use vdock_media::{MediaError, StreamDimensions};
use vdock_models::{Video, VideoId};
use vdock_storage::{ObjectStoreClient, StorageError};

use crate::config::ApiConfig;
use crate::metrics;

/// Content type accepted for video uploads and attached to stored objects.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong between receiving an upload and
/// recording its public URL.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Video not found: {0}")]
    NotFound(VideoId),

    #[error("Video belongs to another user")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Upload I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Probe failed: {0}")]
    Probe(#[source] MediaError),

    #[error("Normalization failed: {0}")]
    Normalize(#[source] MediaError),

    #[error("Object store upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Record update failed: {0}")]
    Persist(#[source] FirestoreError),
}

impl IngestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable label for metrics and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden => "forbidden",
            Self::Validation(_) => "validation",
            Self::Io(_) => "io",
            Self::Probe(_) => "probe",
            Self::Normalize(_) => "normalize",
            Self::Upload(_) => "upload",
            Self::Persist(_) => "persist",
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Reads stream dimensions out of a spooled upload.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<StreamDimensions, MediaError>;
}

/// Rewrites a spooled upload for streaming playback, returning the
/// path of the rewritten copy. The caller owns deleting that copy.
#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    async fn normalize(&self, input: &Path) -> Result<PathBuf, MediaError>;
}

/// Durable object storage fronted by a public distribution root.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str)
        -> Result<(), StorageError>;

    fn public_url(&self, key: &str) -> String;

    /// Cheap connectivity probe for readiness checks.
    async fn check(&self) -> Result<(), StorageError>;
}

/// Video metadata records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: &Video) -> Result<(), FirestoreError>;
    async fn get(&self, id: &VideoId) -> Result<Option<Video>, FirestoreError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Video>, FirestoreError>;
    async fn delete(&self, id: &VideoId) -> Result<(), FirestoreError>;
    async fn set_video_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError>;
    async fn set_thumbnail_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError>;
}

// ---------------------------------------------------------------------------
// Production adapters
// ---------------------------------------------------------------------------

/// Probes via the `ffprobe` binary on `PATH`.
pub struct FfprobeInspector {
    timeout_secs: u64,
}

impl FfprobeInspector {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn dimensions(&self, path: &Path) -> Result<StreamDimensions, MediaError> {
        vdock_media::probe_dimensions(path, Some(self.timeout_secs)).await
    }
}

/// Remuxes via the `ffmpeg` binary on `PATH`, moving index atoms ahead
/// of the media payload without re-encoding.
pub struct FaststartNormalizer {
    timeout_secs: u64,
}

impl FaststartNormalizer {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl MediaNormalizer for FaststartNormalizer {
    async fn normalize(&self, input: &Path) -> Result<PathBuf, MediaError> {
        vdock_media::remux_faststart(input, Some(self.timeout_secs)).await
    }
}

/// S3-backed object store.
pub struct S3ObjectStore {
    client: ObjectStoreClient,
}

impl S3ObjectStore {
    pub fn new(client: ObjectStoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client.upload_file(path, key, content_type).await
    }

    fn public_url(&self, key: &str) -> String {
        self.client.public_url(key)
    }

    async fn check(&self) -> Result<(), StorageError> {
        self.client.check_connectivity().await
    }
}

/// Firestore-backed record store.
pub struct FirestoreVideoStore {
    repo: VideoRepo,
}

impl FirestoreVideoStore {
    pub fn new(repo: VideoRepo) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl VideoStore for FirestoreVideoStore {
    async fn create(&self, video: &Video) -> Result<(), FirestoreError> {
        self.repo.create(video).await
    }

    async fn get(&self, id: &VideoId) -> Result<Option<Video>, FirestoreError> {
        self.repo.get(id).await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Video>, FirestoreError> {
        self.repo.list_for_user(user_id).await
    }

    async fn delete(&self, id: &VideoId) -> Result<(), FirestoreError> {
        self.repo.delete(id).await
    }

    async fn set_video_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError> {
        self.repo.set_video_url(id, url).await
    }

    async fn set_thumbnail_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError> {
        self.repo.set_thumbnail_url(id, url).await
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Per-stage time limits for the pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub spool_timeout: Duration,
    pub probe_timeout_secs: u64,
    pub remux_timeout_secs: u64,
    pub upload_timeout: Duration,
}

impl IngestConfig {
    pub fn from_api(config: &ApiConfig) -> Self {
        Self {
            spool_timeout: config.spool_timeout,
            probe_timeout_secs: config.probe_timeout_secs,
            remux_timeout_secs: config.remux_timeout_secs,
            upload_timeout: config.upload_timeout,
        }
    }
}

/// Orchestrates the upload pipeline against pluggable collaborators.
pub struct IngestService {
    inspector: Arc<dyn MediaInspector>,
    normalizer: Arc<dyn MediaNormalizer>,
    objects: Arc<dyn ObjectStore>,
    videos: Arc<dyn VideoStore>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        inspector: Arc<dyn MediaInspector>,
        normalizer: Arc<dyn MediaNormalizer>,
        objects: Arc<dyn ObjectStore>,
        videos: Arc<dyn VideoStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            inspector,
            normalizer,
            objects,
            videos,
            config,
        }
    }

    /// Load a record and require that `user_id` owns it.
    ///
    /// A record owned by someone else is reported as [`IngestError::Forbidden`],
    /// which the HTTP layer renders identically to a missing token so the
    /// response never confirms that the id exists.
    pub async fn authorize_owner(
        &self,
        id: &VideoId,
        user_id: &str,
    ) -> Result<Video, IngestError> {
        let video = self
            .videos
            .get(id)
            .await
            .map_err(IngestError::Persist)?
            .ok_or_else(|| IngestError::NotFound(id.clone()))?;

        if !video.is_owned_by(user_id) {
            warn!(video_id = %id, "upload rejected: record owned by another user");
            return Err(IngestError::Forbidden);
        }

        Ok(video)
    }

    /// Run the full pipeline for one upload.
    ///
    /// `body` is the raw byte stream of the multipart file field;
    /// `content_type` is the declared type of that field, if any.
    pub async fn ingest<S, E>(
        &self,
        video_id: &VideoId,
        user_id: &str,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let started = Instant::now();
        let result = self.run(video_id, user_id, content_type, body).await;

        match &result {
            Ok(video) => {
                metrics::record_ingest_outcome("complete");
                info!(
                    video_id = %video_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    url = %video.video_url.as_deref().unwrap_or_default(),
                    "ingestion complete"
                );
            }
            Err(e) => {
                metrics::record_ingest_outcome(e.kind());
                warn!(video_id = %video_id, kind = e.kind(), error = %e, "ingestion failed");
            }
        }

        result
    }

    async fn run<S, E>(
        &self,
        video_id: &VideoId,
        user_id: &str,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        self.authorize_owner(video_id, user_id).await?;
        validate_media_type(content_type)?;

        let spooled = self.spool(body).await?;
        self.process_spooled(video_id, &spooled).await
        // `spooled` drops here, removing the original temp file.
    }

    /// Drain `body` into a fresh temp file, bounded by the spool timeout.
    async fn spool<S, E>(&self, body: S) -> Result<NamedTempFile, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let spooled = NamedTempFile::new()?;
        let mut file = tokio::fs::File::from_std(spooled.reopen()?);

        let write_all = async {
            pin_mut!(body);
            let mut written: u64 = 0;
            while let Some(chunk) = body.next().await {
                let chunk =
                    chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e.into()))?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, io::Error>(written)
        };

        let started = Instant::now();
        let written = tokio::time::timeout(self.config.spool_timeout, write_all)
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "spooling timed out after {}s",
                        self.config.spool_timeout.as_secs()
                    ),
                )
            })??;
        metrics::record_ingest_stage("spool", started.elapsed().as_secs_f64());
        metrics::record_upload_bytes(written);

        debug!(bytes = written, path = %spooled.path().display(), "upload spooled");
        Ok(spooled)
    }

    /// Probe, normalize, upload, and record a spooled file.
    async fn process_spooled(
        &self,
        video_id: &VideoId,
        spooled: &NamedTempFile,
    ) -> Result<Video, IngestError> {
        let started = Instant::now();
        let dims = self
            .inspector
            .dimensions(spooled.path())
            .await
            .map_err(IngestError::Probe)?;
        metrics::record_ingest_stage("probe", started.elapsed().as_secs_f64());

        let class = dims.aspect_class();
        info!(
            video_id = %video_id,
            width = dims.width,
            height = dims.height,
            class = %class,
            "probed upload"
        );

        let started = Instant::now();
        let normalized = self
            .normalizer
            .normalize(spooled.path())
            .await
            .map_err(IngestError::Normalize)?;
        metrics::record_ingest_stage("normalize", started.elapsed().as_secs_f64());

        // The normalized copy is removed on every exit path from here on.
        let _cleanup = scopeguard::guard(normalized.clone(), |path| {
            if std::fs::remove_file(&path).is_ok() {
                debug!(path = %path.display(), "removed normalized temp file");
            }
        });

        let key = vdock_storage::object_key(class);
        let started = Instant::now();
        tokio::time::timeout(
            self.config.upload_timeout,
            self.objects.put_file(&normalized, &key, VIDEO_CONTENT_TYPE),
        )
        .await
        .map_err(|_| {
            IngestError::Upload(StorageError::upload_failed(format!(
                "timed out after {}s",
                self.config.upload_timeout.as_secs()
            )))
        })?
        .map_err(IngestError::Upload)?;
        metrics::record_ingest_stage("upload", started.elapsed().as_secs_f64());

        info!(video_id = %video_id, key = %key, "uploaded normalized video");

        let url = self.objects.public_url(&key);
        self.videos
            .set_video_url(video_id, &url)
            .await
            .map_err(IngestError::Persist)
    }
}

/// Require the declared media type to be exactly `video/mp4`, ignoring
/// parameters such as `; codecs=...`.
pub fn validate_media_type(content_type: Option<&str>) -> Result<(), IngestError> {
    let declared = content_type
        .ok_or_else(|| IngestError::validation("Missing content type on video field"))?;

    let essence = declared.split(';').next().unwrap_or_default().trim();
    if !essence.eq_ignore_ascii_case(VIDEO_CONTENT_TYPE) {
        return Err(IngestError::validation(format!(
            "Unsupported media type {essence:?}, expected {VIDEO_CONTENT_TYPE}"
        )));
    }

    Ok(())
}
