/// Opaque refresh token generation and hashing
///
/// Refresh tokens are random values, not JWTs. Only their SHA-256 digest is
/// persisted, so a leaked store dump cannot be replayed.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use crypto_core::hash::sha256_hex;
use rand::{rngs::OsRng, RngCore};

/// Entropy of a raw refresh token in bytes
const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new raw refresh token from the OS random source
///
/// ## Returns
///
/// 43-character base64url string (no padding)
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a raw refresh token for storage and lookup
///
/// ## Returns
///
/// Hex-encoded SHA-256 hash
pub fn hash_refresh_token(raw_token: &str) -> String {
    sha256_hex(raw_token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_tokens_are_unique() {
        let tokens: HashSet<String> = (0..256).map(|_| generate_refresh_token()).collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn test_generated_token_shape() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_consistency() {
        let token = "test_token_12345";
        assert_eq!(hash_refresh_token(token), hash_refresh_token(token));
        assert_ne!(hash_refresh_token("token1"), hash_refresh_token("token2"));
    }

    #[test]
    fn test_hash_length() {
        // SHA-256 produces 64 hex characters
        assert_eq!(hash_refresh_token("any_token").len(), 64);
    }
}
