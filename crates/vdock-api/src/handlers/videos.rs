//! Video record handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vdock_models::{Video, VideoId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum accepted description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Create video request.
#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a new video record owned by the caller.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<Video>)> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Title too long (max {MAX_TITLE_LENGTH} characters)"
        )));
    }

    let description = match request.description.as_deref().map(str::trim) {
        Some(d) if d.len() > MAX_DESCRIPTION_LENGTH => {
            return Err(ApiError::bad_request(format!(
                "Description too long (max {MAX_DESCRIPTION_LENGTH} characters)"
            )));
        }
        Some("") | None => None,
        Some(d) => Some(d.to_string()),
    };

    let video = Video::new(user.user_id, title, description);
    state.videos.create(&video).await?;

    info!(video_id = %video.id, user_id = %video.user_id, "created video record");
    Ok((StatusCode::CREATED, Json(video)))
}

/// List the caller's video records.
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Video>>> {
    let videos = state.videos.list_for_user(&user.user_id).await?;
    Ok(Json(videos))
}

/// Fetch one video record.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    user: AuthUser,
) -> ApiResult<Json<Video>> {
    let video = state
        .ingest
        .authorize_owner(&video_id, &user.user_id)
        .await?;
    Ok(Json(video))
}

/// Delete one video record. Stored objects are not reaped.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    state
        .ingest
        .authorize_owner(&video_id, &user.user_id)
        .await?;
    state.videos.delete(&video_id).await?;

    info!(video_id = %video_id, user_id = %user.user_id, "deleted video record");
    Ok(StatusCode::NO_CONTENT)
}
