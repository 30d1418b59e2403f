//! Shared utility functions for hashing and logging.

use sha2::{Digest, Sha256};
use std::fmt::Display;

// =============================================================================
// Hashing
// =============================================================================

/// SHA-256 of the given text as lowercase hex.
///
/// Used for summary fingerprints and document content hashes.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First 12 hex characters of a hash, for log lines and terminal output.
#[inline]
pub fn short_hash(hash: &str) -> &str {
    &hash[..12.min(hash.len())]
}

// =============================================================================
// Logging
// =============================================================================

/// Keep the `Ok` value; log the error at debug level and drop it.
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_hash("abc"), "abc");
    }
}
