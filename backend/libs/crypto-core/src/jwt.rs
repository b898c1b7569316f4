/// Access token codec shared by session services
///
/// Mints and verifies short-lived access tokens signed with a symmetric HMAC
/// secret. Keys are held by a [`TokenCodec`] value built from configuration,
/// so several codecs with different secrets can live in one process.
///
/// ## Security Design
///
/// - **HS256 ONLY**: any other configured algorithm is rejected when the codec is built
/// - **Inclusive expiry**: a token whose `exp` equals the current second is expired
/// - **Required claims**: `sub` and `email` must be present and non-empty
///
/// ## Usage
///
/// ```rust
/// use chrono::Duration;
/// use crypto_core::jwt::TokenCodec;
/// use uuid::Uuid;
///
/// let codec = TokenCodec::new(b"dev-secret", "HS256", Duration::minutes(15))
///     .expect("HS256 is supported");
///
/// let user_id = Uuid::new_v4();
/// let token = codec.mint(user_id, "user@example.com").unwrap();
/// let claims = codec.verify(&token).unwrap();
/// assert_eq!(claims.email, "user@example.com");
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// The only signing algorithm accepted by [`TokenCodec`]
pub const SUPPORTED_ALGORITHM: &str = "HS256";

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity ID as UUID string)
    #[serde(default)]
    pub sub: String,
    /// Email address of the identity
    #[serde(default)]
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject claim as an identity ID
    pub fn subject_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::TokenInvalid)
    }
}

/// Errors produced while building a codec, minting or verifying tokens
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token is invalid")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("required claims are missing")]
    ClaimsMissing,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

// ============================================================================
// Codec
// ============================================================================

/// Signs and verifies access tokens with a fixed secret and TTL
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SUPPORTED_ALGORITHM)
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Build a codec from a signing secret, algorithm name and access-token TTL
    ///
    /// ## Errors
    ///
    /// Returns [`JwtError::UnsupportedAlgorithm`] if `algorithm` is anything
    /// other than `HS256` (case-insensitive). This is a configuration error and
    /// should surface at startup, not per request.
    pub fn new(secret: &[u8], algorithm: &str, access_ttl: Duration) -> Result<Self, JwtError> {
        if !algorithm.trim().eq_ignore_ascii_case(SUPPORTED_ALGORITHM) {
            return Err(JwtError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
        })
    }

    /// Lifetime of minted access tokens
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Mint an access token for an identity, issued now
    pub fn mint(&self, subject: Uuid, email: &str) -> Result<String, JwtError> {
        self.mint_at(subject, email, Utc::now())
    }

    /// Mint an access token with an explicit issue time
    pub fn mint_at(
        &self,
        subject: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let expiry = issued_at + self.access_ttl;

        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Verify signature, expiry and required claims of an access token
    ///
    /// ## Errors
    ///
    /// - [`JwtError::TokenInvalid`]: bad signature, wrong algorithm, malformed token
    /// - [`JwtError::TokenExpired`]: `now >= exp`
    /// - [`JwtError::ClaimsMissing`]: `sub` or `email` absent or empty
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against an explicit clock reading
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        // Expiry is checked below with an inclusive boundary
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::TokenInvalid,
            },
        )?;
        let claims = token_data.claims;

        if now.timestamp() >= claims.exp {
            return Err(JwtError::TokenExpired);
        }

        if claims.sub.trim().is_empty() || claims.email.trim().is_empty() {
            return Err(JwtError::ClaimsMissing);
        }

        Ok(claims)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"unit-test-signing-secret";

    fn test_codec() -> TokenCodec {
        TokenCodec::new(TEST_SECRET, "HS256", Duration::hours(1)).expect("HS256 is supported")
    }

    #[test]
    fn test_mint_produces_three_segments() {
        let token = test_codec()
            .mint(Uuid::new_v4(), "test@example.com")
            .expect("should mint token");
        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts
    }

    #[test]
    fn test_verify_valid_token() {
        let codec = test_codec();
        let user_id = Uuid::new_v4();
        let token = codec.mint(user_id, "test@example.com").unwrap();

        let claims = codec.verify(&token).expect("token should verify");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.subject_id().unwrap(), user_id);
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        for alg in ["RS256", "HS512", "none", ""] {
            let result = TokenCodec::new(TEST_SECRET, alg, Duration::hours(1));
            assert_eq!(
                result.err(),
                Some(JwtError::UnsupportedAlgorithm(alg.to_string()))
            );
        }
    }

    #[test]
    fn test_algorithm_name_is_case_insensitive() {
        assert!(TokenCodec::new(TEST_SECRET, "hs256", Duration::hours(1)).is_ok());
    }

    #[test]
    fn test_verify_with_other_secret_is_invalid() {
        let token = test_codec().mint(Uuid::new_v4(), "test@example.com").unwrap();
        let other = TokenCodec::new(b"another-secret", "HS256", Duration::hours(1)).unwrap();

        assert_eq!(other.verify(&token), Err(JwtError::TokenInvalid));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let codec = test_codec();
        let issued_at = Utc::now();
        let token = codec
            .mint_at(Uuid::new_v4(), "test@example.com", issued_at)
            .unwrap();

        let just_before = issued_at + Duration::hours(1) - Duration::seconds(1);
        assert!(codec.verify_at(&token, just_before).is_ok());

        let at_expiry = issued_at + Duration::hours(1);
        assert_eq!(
            codec.verify_at(&token, at_expiry),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_zero_ttl_token_is_expired_immediately() {
        let codec = TokenCodec::new(TEST_SECRET, "HS256", Duration::zero()).unwrap();
        let token = codec.mint(Uuid::new_v4(), "test@example.com").unwrap();

        assert_eq!(codec.verify(&token), Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_missing_claims_rejected() {
        let codec = test_codec();
        let now = Utc::now().timestamp();

        // Correctly signed, but without an email claim
        let claims = serde_json::json!({ "sub": Uuid::new_v4().to_string(), "iat": now, "exp": now + 600 });
        let token = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), Err(JwtError::ClaimsMissing));

        let empty_email = codec.mint_at(Uuid::nil(), "", Utc::now()).unwrap();
        assert_eq!(codec.verify(&empty_email), Err(JwtError::ClaimsMissing));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", test_codec());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("unit-test-signing-secret"));
    }
}
