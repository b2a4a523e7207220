//! Content hashing for document etags.
//!
//! SHA256 over the serialized document body, hex encoded.

use sha2::{Digest, Sha256};

/// Compute the etag of a serialized document body.
#[must_use]
pub fn content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}
