//! Upload handlers for video media and thumbnails.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use vdock_models::{Video, VideoId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::ingest::IngestError;
use crate::state::AppState;

/// Multipart field that carries the video payload.
const VIDEO_FIELD: &str = "video";

/// Multipart field that carries the thumbnail payload.
const THUMBNAIL_FIELD: &str = "thumbnail";

/// Run an uploaded video through the ingestion pipeline.
///
/// Unrelated form fields are drained and skipped; the first `video`
/// field is streamed into the pipeline without buffering the payload
/// in memory.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Video>)> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let video = state
            .ingest
            .ingest(&video_id, &user.user_id, content_type.as_deref(), field)
            .await?;

        return Ok((StatusCode::CREATED, Json(video)));
    }

    Err(IngestError::validation("Missing video field").into())
}

/// Store an uploaded thumbnail image and record its URL.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Video>> {
    state
        .ingest
        .authorize_owner(&video_id, &user.user_id)
        .await?;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string()).ok_or_else(|| {
            IngestError::validation("Missing content type on thumbnail field")
        })?;
        let bytes = field.bytes().await.map_err(bad_multipart)?;

        let url = state.assets.save_image(&content_type, &bytes).await?;
        let video = state
            .videos
            .set_thumbnail_url(&video_id, &url)
            .await
            .map_err(IngestError::Persist)?;

        info!(video_id = %video_id, url = %url, "thumbnail stored");
        return Ok(Json(video));
    }

    Err(IngestError::validation("Missing thumbnail field").into())
}

fn bad_multipart(e: MultipartError) -> ApiError {
    IngestError::validation(format!("Malformed multipart body: {e}")).into()
}
