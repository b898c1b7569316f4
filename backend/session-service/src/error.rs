use crate::security::password::PasswordError;
use crate::store::StoreError;
use crypto_core::jwt::JwtError;
use thiserror::Error;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, SessionError>;

/// Caller-visible failure kinds
///
/// Every variant renders a fixed message. Distinct internal causes (unknown
/// email vs wrong password, revoked vs expired token, store errors) are merged
/// into these kinds before they leave the service, so responses never reveal
/// which path rejected the request.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Registration failed")]
    RegistrationFailed,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("Password hashing failed")]
    HashingFailure,

    #[error("Token refresh failed")]
    RefreshFailed,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token claims missing")]
    ClaimsMissing,

    #[error("Internal error")]
    Internal,
}

impl SessionError {
    /// Stable machine-readable code for the transport layer
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::RegistrationFailed => "registration_failed",
            SessionError::InvalidCredentials => "invalid_credentials",
            SessionError::InvalidRefreshToken => "invalid_refresh_token",
            SessionError::UnsupportedAlgorithm => "unsupported_algorithm",
            SessionError::HashingFailure => "hashing_failure",
            SessionError::RefreshFailed => "refresh_failed",
            SessionError::TokenInvalid => "token_invalid",
            SessionError::TokenExpired => "token_expired",
            SessionError::ClaimsMissing => "claims_missing",
            SessionError::Internal => "internal",
        }
    }

    /// Configuration-level kinds that should have been caught at startup
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SessionError::UnsupportedAlgorithm | SessionError::HashingFailure
        )
    }
}

/// Public operation a cause was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Startup,
    SignUp,
    SignIn,
    Refresh,
    SignOut,
    SignOutAll,
    Authenticate,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Operation::Startup => "startup",
            Operation::SignUp => "sign_up",
            Operation::SignIn => "sign_in",
            Operation::Refresh => "refresh",
            Operation::SignOut => "sign_out",
            Operation::SignOutAll => "sign_out_all",
            Operation::Authenticate => "authenticate",
        }
    }
}

/// Detailed reason an operation failed
///
/// Logged at the service boundary and then coalesced into a [`SessionError`].
#[derive(Debug)]
pub(crate) enum Cause {
    /// Pre-read found an identity with the same email
    EmailTaken,
    /// Store rejected the insert on its uniqueness constraint
    DuplicateKey,
    WeakPassword(&'static str),
    UnknownEmail,
    PasswordMismatch,
    /// Refresh token is unknown, revoked or expired
    TokenNotActive,
    /// Refresh token points at an identity that no longer exists
    IdentityMissing,
    /// Refresh token belongs to another identity
    OwnerMismatch,
    /// Transactional rotation rolled back
    RotationAborted(StoreError),
    Store(StoreError),
    Hashing(String),
    Codec(JwtError),
}

impl Cause {
    /// Log the detailed cause and reduce it to its caller-visible kind
    pub(crate) fn coalesce(self, operation: Operation) -> SessionError {
        let kind = match &self {
            Cause::EmailTaken | Cause::DuplicateKey | Cause::WeakPassword(_) => {
                SessionError::RegistrationFailed
            }
            Cause::UnknownEmail | Cause::PasswordMismatch => SessionError::InvalidCredentials,
            Cause::TokenNotActive | Cause::IdentityMissing | Cause::OwnerMismatch => {
                SessionError::InvalidRefreshToken
            }
            Cause::RotationAborted(_) => SessionError::RefreshFailed,
            Cause::Store(_) if operation == Operation::Refresh => SessionError::RefreshFailed,
            Cause::Store(_) => SessionError::Internal,
            Cause::Hashing(_) => SessionError::HashingFailure,
            Cause::Codec(JwtError::UnsupportedAlgorithm(_)) => SessionError::UnsupportedAlgorithm,
            Cause::Codec(JwtError::TokenInvalid) => SessionError::TokenInvalid,
            Cause::Codec(JwtError::TokenExpired) => SessionError::TokenExpired,
            Cause::Codec(JwtError::ClaimsMissing) => SessionError::ClaimsMissing,
            Cause::Codec(JwtError::Encoding(_)) if operation == Operation::Refresh => {
                SessionError::RefreshFailed
            }
            Cause::Codec(JwtError::Encoding(_)) => SessionError::Internal,
        };

        if self.is_expected() {
            debug!(
                operation = operation.as_str(),
                cause = ?self,
                error_code = kind.code(),
                "Request rejected"
            );
        } else {
            error!(
                operation = operation.as_str(),
                cause = ?self,
                error_code = kind.code(),
                "Operation failed"
            );
        }

        kind
    }

    /// Rejections driven by client input rather than a fault
    fn is_expected(&self) -> bool {
        matches!(
            self,
            Cause::EmailTaken
                | Cause::DuplicateKey
                | Cause::WeakPassword(_)
                | Cause::UnknownEmail
                | Cause::PasswordMismatch
                | Cause::TokenNotActive
                | Cause::IdentityMissing
                | Cause::OwnerMismatch
                | Cause::Codec(JwtError::TokenInvalid)
                | Cause::Codec(JwtError::TokenExpired)
                | Cause::Codec(JwtError::ClaimsMissing)
        )
    }
}

impl From<PasswordError> for Cause {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => Cause::PasswordMismatch,
            PasswordError::Hashing(msg) => Cause::Hashing(msg),
        }
    }
}

impl From<JwtError> for Cause {
    fn from(err: JwtError) -> Self {
        Cause::Codec(err)
    }
}

impl From<StoreError> for Cause {
    fn from(err: StoreError) -> Self {
        Cause::Store(err)
    }
}
