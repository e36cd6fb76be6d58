//! SHA-256 checksums of package files

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data` (64 characters)
///
/// # Examples
///
/// ```
/// use dora_roi::core::verification::checksum::sha256_hex;
///
/// let checksum = sha256_hex(b"c0010\r\n");
/// assert_eq!(checksum.len(), 64);
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_different_content_different_digest() {
        assert_ne!(sha256_hex(b"true"), sha256_hex(b"false"));
        assert!(sha256_hex(b"").chars().all(|c| c.is_ascii_hexdigit()));
    }
}
