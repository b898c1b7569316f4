/// Session Service Library
///
/// Session lifecycle for registered identities: sign-up, sign-in, refresh
/// token rotation and sign-out.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: PostgreSQL store gateways and migrations
/// - `error`: Error types
/// - `logging`: Tracing subscriber setup
/// - `models`: Data models
/// - `security`: Password hashing, refresh tokens, access token codec
/// - `services`: Session manager and rotation strategies
/// - `store`: Store gateway traits and in-memory implementations
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod security;
pub mod services;
pub mod store;
pub mod validators;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use services::SessionManager;
