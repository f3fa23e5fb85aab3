//! Cryptographic utilities for token generation, hashing, and public references.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

/// Alphabet for human-facing references. Omits 0/O and 1/I/L.
const REFERENCE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Number of random characters in a reference code.
pub const REFERENCE_LENGTH: usize = 6;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a URL-safe random token from `byte_len` random bytes.
///
/// Used for refresh-session secrets and booking manage links. Only the
/// SHA-256 of the token is ever stored.
pub fn generate_secure_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a public reference such as `BK-7F3A9C`.
///
/// References appear in email subjects as `[BK-7F3A9C]` so replies can be
/// routed back to their conversation.
pub fn generate_reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..REFERENCE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..REFERENCE_ALPHABET.len());
            REFERENCE_ALPHABET[idx] as char
        })
        .collect();
    format!("{}-{}", prefix, code)
}

/// Compares two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_secure_token_is_url_safe() {
        let token = generate_secure_token(32);
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_secure_tokens_differ() {
        assert_ne!(generate_secure_token(16), generate_secure_token(16));
    }

    #[test]
    fn test_generate_reference_format() {
        let reference = generate_reference("BK");
        assert_eq!(reference.len(), 3 + REFERENCE_LENGTH);
        assert!(reference.starts_with("BK-"));
        assert!(reference[3..]
            .bytes()
            .all(|b| REFERENCE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_reference_avoids_ambiguous_characters() {
        for _ in 0..200 {
            let reference = generate_reference("CT");
            let code = &reference[3..];
            assert!(!code.contains('0'));
            assert!(!code.contains('O'));
            assert!(!code.contains('I'));
            assert!(!code.contains('1'));
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
