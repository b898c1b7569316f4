/// Security primitives for session-service
///
/// - **password**: Argon2id password hashing with a configurable cost factor
/// - **refresh_token**: opaque refresh token generation and SHA-256 hashing
///
/// Access token signing lives in the shared `crypto-core` crate and is
/// re-exported here.
pub use crypto_core::jwt::{Claims, JwtError, TokenCodec};

pub mod password;
pub mod refresh_token;

pub use password::{hash_password, verify_password, PasswordError};
pub use refresh_token::{generate_refresh_token, hash_refresh_token};
