/// Data models for identities, refresh tokens and session payloads
pub mod identity;
pub mod refresh_token;
pub mod session;

pub use identity::{Identity, PublicIdentity};
pub use refresh_token::{RefreshTokenRecord, RefreshTokenState};
pub use session::{
    AuthSession, RefreshRequest, RefreshedTokens, Registration, SignInRequest, SignOutRequest,
    SignUpRequest, TOKEN_TYPE_BEARER,
};
