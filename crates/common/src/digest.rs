//! SHA-256 digests over caller-supplied values.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Digest a caller-supplied identifier before it is used as a lookup key.
///
/// Bounds key length and keeps hostile identifiers out of the backend
/// indexes. The same value always digests to the same key.
pub fn key_digest(value: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(value.as_bytes()))
}

/// Compute the `digest` header value covering a request body.
pub fn body_digest(body: &[u8]) -> String {
    format!("SHA-256={}", STANDARD.encode(Sha256::digest(body)))
}
