//! Content fingerprinting for cache and index namespacing.

use sha2::{Digest, Sha256};

/// Derives the stable fingerprint of a document from its raw bytes.
///
/// The fingerprint namespaces every embedding record belonging to the
/// document (`{fingerprint}_{ordinal}`), so byte-identical re-uploads are
/// detected as cache hits instead of being re-embedded. SHA-256 is used for
/// its collision resistance; the threat model is accidental reuse detection,
/// not tamper-proofing.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_share_a_fingerprint() {
        assert_eq!(fingerprint(b"contract v1"), fingerprint(b"contract v1"));
    }

    #[test]
    fn distinct_bytes_do_not() {
        assert_ne!(fingerprint(b"contract v1"), fingerprint(b"contract v2"));
    }

    #[test]
    fn fingerprint_is_fixed_length_hex() {
        let fp = fingerprint(b"");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
