//! Key exchange.

use super::GUID;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// Sample nonce from RFC 6455, for fixtures only.
pub const SAMPLE_SEC_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

/// Generate a new `sec-websocket-key` from 16 random bytes.
#[inline]
pub fn new_sec_key() -> String {
    let input: [u8; 16] = rand::random();
    STANDARD.encode(input)
}

/// Derive `sec-websocket-accept` from `sec-websocket-key`.
#[inline]
pub fn derive_accept_key(sec_key: &str) -> String {
    let mut sha1 = Sha1::default();
    sha1.update(sec_key.as_bytes());
    sha1.update(GUID);
    STANDARD.encode(sha1.finalize())
}

/// Check the server's `sec-websocket-accept` against the key we sent.
#[inline]
pub fn validate_accept_key(sec_key: &str, sec_accept: &str) -> bool {
    derive_accept_key(sec_key) == sec_accept
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generate_sec_key() {
        for _ in 0..=1024 {
            let key = new_sec_key();
            assert_eq!(key.len(), 24);
            assert_eq!(STANDARD.decode(&key).unwrap().len(), 16);
        }
        assert_ne!(new_sec_key(), new_sec_key());
    }

    #[test]
    fn derive_sec_key() {
        assert_eq!(
            derive_accept_key(SAMPLE_SEC_KEY),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn validate_sec_key() {
        assert!(validate_accept_key(SAMPLE_SEC_KEY, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
        assert!(!validate_accept_key(SAMPLE_SEC_KEY, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo"));
        assert!(!validate_accept_key(SAMPLE_SEC_KEY, "S3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
        assert!(!validate_accept_key(SAMPLE_SEC_KEY, ""));
        assert!(!validate_accept_key("dGhlIHNhbXBsZSBub25jZA==", "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
    }
}
