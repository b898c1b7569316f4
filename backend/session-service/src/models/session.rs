use super::identity::PublicIdentity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Token type reported alongside issued access tokens
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Sign-up request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(custom(function = "crate::validators::validate_email_validator"))]
    pub email: String,
    #[validate(
        length(min = 8, max = 128),
        custom(function = "crate::validators::validate_password_policy_validator")
    )]
    pub password: String,
}

/// Sign-in request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(custom(function = "crate::validators::validate_email_validator"))]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: String,
}

/// Sign-out request for a single refresh token
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignOutRequest {
    pub identity_id: Uuid,
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: String,
}

/// Result of a successful sign-up
///
/// `refresh_token` is `None` when the initial refresh record could not be
/// stored; the caller can sign in again to obtain one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub identity: PublicIdentity,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: PublicIdentity,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Result of a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
