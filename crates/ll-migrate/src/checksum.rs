//! SHA-256 fingerprints of forward scripts.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Compute the fingerprint of a forward script.
///
/// Hashes the exact bytes, so any edit (whitespace included) to an applied
/// script changes the result.
pub fn fingerprint(forward_sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(forward_sql.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether `s` looks like a fingerprint produced by [`fingerprint`].
pub fn is_fingerprint(s: &str) -> bool {
    s.len() == FINGERPRINT_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
