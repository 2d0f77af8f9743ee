//! End-to-end API tests against the full router with fake backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;

use vdock_api::auth::{Claims, TokenVerifier};
use vdock_api::services::ingest::{
    IngestConfig, IngestService, MediaInspector, MediaNormalizer, ObjectStore, VideoStore,
};
use vdock_api::services::AssetStore;
use vdock_api::{create_router, ApiConfig, AppState};
use vdock_firestore::FirestoreError;
use vdock_media::{MediaError, StreamDimensions};
use vdock_models::{Video, VideoId};
use vdock_storage::StorageError;

const TEST_SECRET: &str = "integration-test-secret";
const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeInspector {
    width: u32,
    height: u32,
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn dimensions(&self, _path: &Path) -> Result<StreamDimensions, MediaError> {
        Ok(StreamDimensions {
            width: self.width,
            height: self.height,
        })
    }
}

struct FakeNormalizer;

#[async_trait]
impl MediaNormalizer for FakeNormalizer {
    async fn normalize(&self, input: &Path) -> Result<PathBuf, MediaError> {
        let output = vdock_media::faststart_output_path(input);
        std::fs::copy(input, &output).map_err(MediaError::Io)?;
        Ok(output)
    }
}

#[derive(Default)]
struct FakeObjects {
    uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        assert!(path.exists());
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/{key}")
    }

    async fn check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeVideos {
    records: Mutex<HashMap<String, Video>>,
}

#[async_trait]
impl VideoStore for FakeVideos {
    async fn create(&self, video: &Video) -> Result<(), FirestoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(video.id.to_string(), video.clone());
        Ok(())
    }

    async fn get(&self, id: &VideoId) -> Result<Option<Video>, FirestoreError> {
        Ok(self.records.lock().unwrap().get(id.as_str()).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Video>, FirestoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &VideoId) -> Result<(), FirestoreError> {
        self.records.lock().unwrap().remove(id.as_str());
        Ok(())
    }

    async fn set_video_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError> {
        let mut records = self.records.lock().unwrap();
        let video = records
            .get_mut(id.as_str())
            .ok_or_else(|| FirestoreError::not_found(id.as_str()))?;
        video.video_url = Some(url.to_string());
        Ok(video.clone())
    }

    async fn set_thumbnail_url(&self, id: &VideoId, url: &str) -> Result<Video, FirestoreError> {
        let mut records = self.records.lock().unwrap();
        let video = records
            .get_mut(id.as_str())
            .ok_or_else(|| FirestoreError::not_found(id.as_str()))?;
        video.thumbnail_url = Some(url.to_string());
        Ok(video.clone())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    videos: Arc<FakeVideos>,
    objects: Arc<FakeObjects>,
    // Held so the assets directory outlives the requests
    _assets_dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_dimensions(1920, 1080)
    }

    fn with_dimensions(width: u32, height: u32) -> Self {
        let assets_dir = tempfile::tempdir().unwrap();

        let config = ApiConfig {
            jwt_secret: TEST_SECRET.to_string(),
            assets_dir: assets_dir.path().to_path_buf(),
            public_base_url: "http://api.test".to_string(),
            ..ApiConfig::default()
        };

        let videos = Arc::new(FakeVideos::default());
        let objects = Arc::new(FakeObjects::default());
        let videos_dyn: Arc<dyn VideoStore> = videos.clone();
        let objects_dyn: Arc<dyn ObjectStore> = objects.clone();

        let ingest = IngestService::new(
            Arc::new(FakeInspector { width, height }),
            Arc::new(FakeNormalizer),
            objects_dyn.clone(),
            videos_dyn.clone(),
            IngestConfig::from_api(&config),
        );

        let assets = AssetStore::new(
            config.assets_dir.clone(),
            config.public_base_url.clone(),
        );

        let state = AppState {
            verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
            ingest: Arc::new(ingest),
            videos: videos_dyn,
            objects: objects_dyn,
            assets: Arc::new(assets),
            config,
        };

        Self {
            router: create_router(state, None),
            videos,
            objects,
            _assets_dir: assets_dir,
        }
    }

    fn seed_video(&self, user_id: &str) -> VideoId {
        let video = Video::new(user_id, "Seeded clip", None);
        let id = video.id.clone();
        self.videos
            .records
            .lock()
            .unwrap()
            .insert(id.to_string(), video);
        id
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes)
    }
}

fn token_for(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: Some(chrono::Utc::now().timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(path: &str, token: Option<&str>, field: &str, media_type: &str) -> Request<Body> {
    let body = multipart_body(field, media_type, b"fake-payload-bytes");
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

fn json_request(method: &str, path: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// Record CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_get_list_delete_round_trip() {
    let app = TestApp::new();
    let token = token_for("user-1");

    let (status, created) = app
        .send(json_request(
            "POST",
            "/api/videos",
            Some(&token),
            Some(r#"{"title": "My clip", "description": "about things"}"#),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "My clip");
    assert_eq!(created["user_id"], "user-1");
    assert!(created["video_url"].is_null());

    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = app
        .send(json_request(
            "GET",
            &format!("/api/videos/{id}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());

    let (status, listed) = app
        .send(json_request("GET", "/api/videos", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(json_request(
            "DELETE",
            &format!("/api/videos/{id}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(json_request(
            "GET",
            &format!("/api/videos/{id}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_blank_title() {
    let app = TestApp::new();
    let token = token_for("user-1");

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/videos",
            Some(&token),
            Some(r#"{"title": "   "}"#),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Title"));
}

#[tokio::test]
async fn records_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let id = app.seed_video("owner");

    // Another authenticated user sees an empty list and cannot read the record
    let token = token_for("someone-else");
    let (status, listed) = app
        .send(json_request("GET", "/api/videos", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let (status, body) = app
        .send(json_request(
            "GET",
            &format!("/api/videos/{id}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // The response must not reveal that the record exists
    assert_eq!(body["detail"], "Unauthorized");
}

// ---------------------------------------------------------------------------
// Video upload pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_runs_pipeline_and_returns_updated_record() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some(&token),
            "video",
            "video/mp4",
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["video_url"].as_str().unwrap();
    assert!(
        url.starts_with("https://cdn.test/landscape/"),
        "unexpected url: {url}"
    );
    assert!(url.ends_with(".mp4"));

    let uploads = app.objects.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].starts_with("landscape/"));
}

#[tokio::test]
async fn upload_classifies_portrait_dimensions() {
    let app = TestApp::with_dimensions(1080, 1920);
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some(&token),
            "video",
            "video/mp4",
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["video_url"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.test/portrait/"));
}

#[tokio::test]
async fn upload_rejects_wrong_media_type() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some(&token),
            "video",
            "image/png",
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
    assert!(app.objects.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_rejects_missing_field() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some(&token),
            "attachment",
            "video/mp4",
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn upload_requires_authentication() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");

    let (status, _) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            None,
            "video",
            "video/mp4",
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some("not-a-jwt"),
            "video",
            "video/mp4",
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_to_unknown_record_is_not_found() {
    let app = TestApp::new();
    let token = token_for("user-1");

    let (status, _) = app
        .send(upload_request(
            "/api/videos/does-not-exist/upload",
            Some(&token),
            "video",
            "video/mp4",
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_to_foreign_record_is_indistinguishable_from_unauthenticated() {
    let app = TestApp::new();
    let id = app.seed_video("owner");
    let token = token_for("intruder");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/upload"),
            Some(&token),
            "video",
            "video/mp4",
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized");
    assert!(app.objects.uploads.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Thumbnail upload and asset serving
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thumbnail_upload_stores_asset_and_serves_it_back() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/thumbnail"),
            Some(&token),
            "thumbnail",
            "image/png",
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let url = body["thumbnail_url"].as_str().unwrap();
    assert!(
        url.starts_with("http://api.test/assets/"),
        "unexpected url: {url}"
    );
    assert!(url.ends_with(".png"));

    // The stored file is served at the recorded path
    let name = url.rsplit('/').next().unwrap();
    let (status, served) = app
        .send_raw(json_request("GET", &format!("/assets/{name}"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&served[..], b"fake-payload-bytes");
}

#[tokio::test]
async fn thumbnail_upload_rejects_non_image_types() {
    let app = TestApp::new();
    let id = app.seed_video("user-1");
    let token = token_for("user-1");

    let (status, body) = app
        .send(upload_request(
            &format!("/api/videos/{id}/thumbnail"),
            Some(&token),
            "thumbnail",
            "video/mp4",
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_open_and_reports_version() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request("GET", "/health", None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn ready_reports_object_store_check() {
    let app = TestApp::new();

    let (status, body) = app.send(json_request("GET", "/ready", None, None)).await;
    // The media tool checks depend on the host, but the fake object
    // store always answers
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {status}"
    );
    assert_eq!(body["checks"]["object_store"]["status"], "ok");
}
