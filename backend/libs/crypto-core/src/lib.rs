//! Shared cryptographic helpers for session services
//!
//! - `jwt`: HS256 access token codec
//! - `hash`: SHA-256 digests for secret lookup keys
pub mod hash;
pub mod jwt;

pub use jwt::{Claims, JwtError, TokenCodec};
