/// Service layer for session-service
///
/// - **session**: sign-up, sign-in, refresh, sign-out and access token checks
/// - **rotation**: transactional and best-effort refresh token rotation
pub mod rotation;
pub mod session;

pub use rotation::RotationStrategy;
pub use session::SessionManager;
