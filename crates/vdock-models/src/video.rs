//! Video record models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video record.
///
/// Serializes transparently as its inner string, so path parameters
/// and stored documents both see a plain id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A video record as stored in the metadata store.
///
/// The media URLs start out unset and are filled in by the upload
/// paths: `video_url` by the ingestion pipeline, `thumbnail_url` by
/// the thumbnail endpoint. `user_id` is fixed at creation and is the
/// basis for every ownership check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// User ID (owner, immutable)
    pub user_id: String,

    /// Video title
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Public URL of the ingested video, set on successful ingestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Public URL of the thumbnail, set by the thumbnail upload path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Create a new record with no media locations.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id: user_id.into(),
            title: title.into(),
            description,
            video_url: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given user owns this record.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        assert_ne!(VideoId::new(), VideoId::new());
    }

    #[test]
    fn test_new_video_has_no_media_urls() {
        let video = Video::new("user123", "My Clip", None);
        assert!(video.video_url.is_none());
        assert!(video.thumbnail_url.is_none());
        assert_eq!(video.user_id, "user123");
        assert!(video.is_owned_by("user123"));
        assert!(!video.is_owned_by("user456"));
    }

    #[test]
    fn test_unset_urls_are_omitted_from_json() {
        let video = Video::new("user123", "My Clip", None);
        let json = serde_json::to_value(&video).unwrap();
        assert!(json.get("video_url").is_none());
        assert!(json.get("thumbnail_url").is_none());
        assert_eq!(json["title"], "My Clip");
    }

    #[test]
    fn test_video_round_trips_through_json() {
        let mut video = Video::new("user123", "My Clip", Some("about a dog".to_string()));
        video.video_url = Some("https://cdn.example.com/landscape/abc.mp4".to_string());
        let json = serde_json::to_string(&video).unwrap();
        let back: Video = serde_json::from_str(&json).unwrap();
        assert_eq!(back, video);
    }
}
