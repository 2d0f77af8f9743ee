//! Aspect-ratio classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse aspect-ratio bucket for an uploaded video.
///
/// The bucket doubles as the storage key prefix, so ingested files are
/// partitioned by orientation in the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// Roughly 16:9
    Landscape,
    /// Roughly 9:16
    Portrait,
    /// Anything else (square, anamorphic, unusual)
    Other,
}

impl AspectClass {
    /// Classify a frame size into a coarse orientation bucket.
    ///
    /// Integer division on purpose: 1920x1080 and 1280x720 both land in
    /// `Landscape`, and small rounding differences in encoder output do
    /// not flip the bucket. Near-square and unusual resolutions fall
    /// through to `Other`.
    pub fn classify(width: u32, height: u32) -> Self {
        if width / 16 == height / 9 {
            AspectClass::Landscape
        } else if width / 9 == height / 16 {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
