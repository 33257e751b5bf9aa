//! Package Integrity Check
//!
//! SHA-256 digest of a pushed package image, compared against the digest
//! the instance was provisioned with. A mismatch surfaces as the
//! `IntegrityCheckFailed` result code at download completion.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Case-insensitive comparison against an expected hex digest.
pub fn digest_matches(expected_hex: &str, data: &[u8]) -> bool {
    expected_hex.eq_ignore_ascii_case(&sha256_hex(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(sha256_hex(b"abc"), expected);
        assert!(digest_matches(expected, b"abc"));
        assert!(digest_matches(&expected.to_uppercase(), b"abc"));
    }

    #[test]
    fn test_mismatch() {
        assert!(!digest_matches(&sha256_hex(b"abc"), b"abd"));
    }
}
