//! SHA256 digest utilities for registry references
//!
//! Centralized helpers for validating digest references, deriving the short
//! hash used in archive tag names and checking manifest bodies against the
//! digest they were fetched by.

use crate::error::{PurgeError, Result};
use sha2::Digest;

/// Prefix of every digest this tool handles
pub const SHA256_PREFIX: &str = "sha256:";

/// Number of hex characters of the hash used in archive tag names
pub const SHORT_HASH_LEN: usize = 8;

/// Utilities for working with SHA256 digests
pub struct DigestUtils;

impl DigestUtils {
    /// Compute SHA256 hex digest from byte data
    pub fn compute_sha256(data: &[u8]) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Compute full digest (with sha256: prefix) from byte data
    pub fn compute_docker_digest(data: &[u8]) -> String {
        format!("{}{}", SHA256_PREFIX, Self::compute_sha256(data))
    }

    /// Validate SHA256 hex string (64 characters, all hex)
    pub fn is_valid_sha256_hex(digest: &str) -> bool {
        digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Extract SHA256 hex part from full digest
    pub fn extract_hex_part(digest: &str) -> Result<&str> {
        match digest.strip_prefix(SHA256_PREFIX) {
            Some(hex_part) if Self::is_valid_sha256_hex(hex_part) => Ok(hex_part),
            Some(_) => Err(PurgeError::Validation(format!(
                "Invalid SHA256 hex part in digest: {}",
                digest
            ))),
            None => Err(PurgeError::Validation(format!(
                "Reference has to be a digest (sha256:<hex>): {}",
                digest
            ))),
        }
    }

    /// First eight hex characters of the hash portion
    pub fn short_hash(digest: &str) -> Result<&str> {
        Ok(&Self::extract_hex_part(digest)?[..SHORT_HASH_LEN])
    }

    /// Verify data matches expected digest
    pub fn verify_data_integrity(data: &[u8], expected_digest: &str) -> Result<()> {
        let expected_hex = Self::extract_hex_part(expected_digest)?;
        let computed = Self::compute_sha256(data);

        if !computed.eq_ignore_ascii_case(expected_hex) {
            return Err(PurgeError::Validation(format!(
                "Data integrity check failed: expected {}, computed {}{}",
                expected_digest, SHA256_PREFIX, computed
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn computes_known_digest() {
        assert_eq!(DigestUtils::compute_docker_digest(b""), EMPTY);
    }

    #[test]
    fn short_hash_takes_eight_hex_chars() {
        assert_eq!(DigestUtils::short_hash(EMPTY).unwrap(), "e3b0c442");
    }

    #[test]
    fn rejects_non_digest_references() {
        assert!(matches!(
            DigestUtils::short_hash("latest"),
            Err(PurgeError::Validation(_))
        ));
        assert!(matches!(
            DigestUtils::short_hash("sha256:abc"),
            Err(PurgeError::Validation(_))
        ));
        assert!(matches!(
            DigestUtils::extract_hex_part("sha512:e3b0"),
            Err(PurgeError::Validation(_))
        ));
    }

    #[test]
    fn integrity_check_detects_mismatch() {
        assert!(DigestUtils::verify_data_integrity(b"", EMPTY).is_ok());
        assert!(matches!(
            DigestUtils::verify_data_integrity(b"{}", EMPTY),
            Err(PurgeError::Validation(_))
        ));
    }
}
