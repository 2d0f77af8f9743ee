//! Storage key derivation.
//!
//! Keys partition the bucket by aspect class so landscape, portrait,
//! and other uploads live under separate prefixes. The name under the
//! prefix is fresh randomness, never derived from user input.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use vdock_models::AspectClass;

/// Random bytes behind each object key name.
const KEY_RANDOM_BYTES: usize = 32;

/// Derive a fresh storage key: `{class}/{url-safe-base64}.mp4`.
pub fn object_key(class: AspectClass) -> String {
    let mut bytes = [0u8; KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    object_key_from_bytes(class, &bytes)
}

/// Derive the key for an explicit byte sequence.
pub fn object_key_from_bytes(class: AspectClass, bytes: &[u8]) -> String {
    format!("{}/{}.mp4", class.as_str(), URL_SAFE_NO_PAD.encode(bytes))
}

/// Public URL of a stored object under the distribution root.
pub fn public_url(distribution_root: &str, key: &str) -> String {
    format!("{}/{}", distribution_root.trim_end_matches('/'), key)
}
