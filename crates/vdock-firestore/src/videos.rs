//! Video record repository.
//!
//! Records live in a root-level `videos` collection keyed by video id.
//! Ownership is a `user_id` field on each document, so per-user listing
//! is a field-filtered query rather than a subcollection walk.

use std::collections::HashMap;

use chrono::Utc;
use tracing::warn;

use vdock_models::{Video, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{
    CollectionSelector, Document, FieldFilter, FieldReference, Filter, FromFirestoreValue, Order,
    StructuredQuery, ToFirestoreValue, Value,
};

/// Collection holding all video records.
pub const VIDEOS_COLLECTION: &str = "videos";

/// Repository for video records.
#[derive(Clone)]
pub struct VideoRepo {
    client: FirestoreClient,
}

impl VideoRepo {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Persist a freshly created record.
    pub async fn create(&self, video: &Video) -> FirestoreResult<()> {
        self.client
            .create_document(VIDEOS_COLLECTION, video.id.as_str(), video_to_fields(video))
            .await?;
        Ok(())
    }

    /// Fetch a record by id. Returns `None` when it does not exist.
    pub async fn get(&self, id: &VideoId) -> FirestoreResult<Option<Video>> {
        match self
            .client
            .get_document(VIDEOS_COLLECTION, id.as_str())
            .await?
        {
            Some(doc) => Ok(Some(video_from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// List all records owned by a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> FirestoreResult<Vec<Video>> {
        let docs = self.client.run_query(list_query(user_id)).await?;

        let mut videos = Vec::with_capacity(docs.len());
        let mut parse_errors = 0u32;

        for doc in &docs {
            match video_from_document(doc) {
                Ok(video) => videos.push(video),
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        doc_name = doc.name.as_deref().unwrap_or("<unnamed>"),
                        error = %e,
                        "Failed to parse video document"
                    );
                    parse_errors += 1;
                }
            }
        }

        if parse_errors > 0 {
            warn!(
                user_id = %user_id,
                parse_errors = parse_errors,
                "Some video documents failed to parse"
            );
        }

        Ok(videos)
    }

    /// Delete a record. Deleting a missing record is not an error.
    pub async fn delete(&self, id: &VideoId) -> FirestoreResult<()> {
        self.client
            .delete_document(VIDEOS_COLLECTION, id.as_str())
            .await
    }

    /// Write the media URL onto a record and return the updated record.
    pub async fn set_video_url(&self, id: &VideoId, url: &str) -> FirestoreResult<Video> {
        self.patch_url_field(id, "video_url", url).await
    }

    /// Write the thumbnail URL onto a record and return the updated record.
    pub async fn set_thumbnail_url(&self, id: &VideoId, url: &str) -> FirestoreResult<Video> {
        self.patch_url_field(id, "thumbnail_url", url).await
    }

    async fn patch_url_field(
        &self,
        id: &VideoId,
        field: &str,
        url: &str,
    ) -> FirestoreResult<Video> {
        let mut fields = HashMap::new();
        fields.insert(field.to_string(), url.to_firestore_value());
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        let doc = self
            .client
            .update_document(
                VIDEOS_COLLECTION,
                id.as_str(),
                fields,
                Some(vec![field.to_string(), "updated_at".to_string()]),
            )
            .await?;

        video_from_document(&doc)
    }
}

// =============================================================================
// Document Mapping
// =============================================================================

/// Query for all videos owned by one user, newest first.
fn list_query(user_id: &str) -> StructuredQuery {
    StructuredQuery {
        from: vec![CollectionSelector {
            collection_id: VIDEOS_COLLECTION.to_string(),
            all_descendants: None,
        }],
        r#where: Some(Filter {
            field_filter: Some(FieldFilter {
                field: FieldReference {
                    field_path: "user_id".to_string(),
                },
                op: "EQUAL".to_string(),
                value: user_id.to_firestore_value(),
            }),
        }),
        order_by: Some(vec![Order {
            field: FieldReference {
                field_path: "created_at".to_string(),
            },
            direction: "DESCENDING".to_string(),
        }]),
        limit: None,
    }
}

fn video_to_fields(video: &Video) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("user_id".to_string(), video.user_id.to_firestore_value());
    fields.insert("title".to_string(), video.title.to_firestore_value());
    fields.insert(
        "description".to_string(),
        video.description.to_firestore_value(),
    );
    fields.insert(
        "video_url".to_string(),
        video.video_url.to_firestore_value(),
    );
    fields.insert(
        "thumbnail_url".to_string(),
        video.thumbnail_url.to_firestore_value(),
    );
    fields.insert(
        "created_at".to_string(),
        video.created_at.to_firestore_value(),
    );
    fields.insert(
        "updated_at".to_string(),
        video.updated_at.to_firestore_value(),
    );
    fields
}

fn video_from_document(doc: &Document) -> FirestoreResult<Video> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("video document has no resource name"))?;

    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::invalid_response("video document has no fields"))?;

    Ok(Video {
        id: VideoId::from(id),
        user_id: require(fields, "user_id")?,
        title: require(fields, "title")?,
        description: optional(fields, "description"),
        video_url: optional(fields, "video_url"),
        thumbnail_url: optional(fields, "thumbnail_url"),
        created_at: require(fields, "created_at")?,
        updated_at: require(fields, "updated_at")?,
    })
}

fn require<T: FromFirestoreValue>(
    fields: &HashMap<String, Value>,
    name: &str,
) -> FirestoreResult<T> {
    fields
        .get(name)
        .and_then(|v| T::from_firestore_value(v))
        .ok_or_else(|| {
            FirestoreError::invalid_response(format!(
                "video document missing or mistyped field: {}",
                name
            ))
        })
}

fn optional<T: FromFirestoreValue>(fields: &HashMap<String, Value>, name: &str) -> Option<T> {
    fields.get(name).and_then(|v| T::from_firestore_value(v))
}

// =============================================================================
// Tests
// =============================================================================
