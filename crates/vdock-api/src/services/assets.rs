//! Local asset storage for thumbnails.
//!
//! Thumbnails are small enough to live on local disk next to the API
//! and get served straight from `/assets`. Names are fresh randomness,
//! never derived from user input.

use std::io;
use std::path::PathBuf;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use tracing::debug;

use super::ingest::IngestError;

/// Random bytes behind each asset name.
const ASSET_RANDOM_BYTES: usize = 32;

/// Stores uploaded images under a local directory served at `/assets`.
pub struct AssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl AssetStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }

    /// Create the backing directory if it does not exist yet.
    pub async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Persist an image and return its public URL.
    ///
    /// The declared media type must be `image/*`; the subtype becomes
    /// the file extension. A partially written file is removed before
    /// the error is returned.
    pub async fn save_image(
        &self,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<String, IngestError> {
        let ext = image_extension(media_type)?;
        let name = asset_name(&ext);
        let path = self.root.join(&name);

        if let Err(e) = tokio::fs::write(&path, bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(IngestError::Io(e));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "stored asset");
        Ok(format!(
            "{}/assets/{}",
            self.public_base_url.trim_end_matches('/'),
            name
        ))
    }
}

fn asset_name(ext: &str) -> String {
    let mut bytes = [0u8; ASSET_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}.{}", URL_SAFE_NO_PAD.encode(bytes), ext)
}

/// Extension for an `image/*` media type, with parameters stripped.
///
/// Subtype characters are restricted so the stored name can never
/// escape the assets directory.
fn image_extension(media_type: &str) -> Result<String, IngestError> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let subtype = essence.strip_prefix("image/").ok_or_else(|| {
        IngestError::validation(format!(
            "Unsupported media type {essence:?}, expected image/*"
        ))
    })?;

    let valid = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return Err(IngestError::validation(format!(
            "Unsupported image subtype {subtype:?}"
        )));
    }

    Ok(subtype.to_string())
}
