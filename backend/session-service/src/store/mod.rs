//! Store gateways for identities and refresh tokens
//!
//! The session manager talks to persistence only through these traits.
//! Implementations:
//!
//! - [`memory`]: in-process gateways with a switchable transaction capability
//! - [`crate::db`]: PostgreSQL gateways on sqlx
//!
//! Every method is individually atomic at the store level. Dropping a returned
//! future cancels the call; implementations must not leave partial writes
//! behind when that happens.

use crate::models::{Identity, RefreshTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::{MemoryIdentityStore, MemoryRefreshTokenStore};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by store gateways
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("duplicate key")]
    DuplicateKey,

    /// A transaction rolled back without applying any change
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateKey
            }
            _ => {
                tracing::error!("Database error: {}", err);
                StoreError::Backend(err.to_string())
            }
        }
    }
}

/// Identity persistence
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the email is already registered.
    async fn create(&self, identity: &Identity) -> StoreResult<()>;

    /// Find an identity by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Find an identity by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>>;
}

/// Refresh token persistence
///
/// Gateways receive raw token values and persist only their hash.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store a new active record for `raw_token`
    async fn create(
        &self,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord>;

    /// Find the record for `raw_token` if it is neither revoked nor expired
    async fn find_active(&self, raw_token: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Mark a record revoked. Revoking an already revoked record is a no-op.
    async fn revoke(&self, record_id: Uuid) -> StoreResult<()>;

    /// Revoke every active record of an identity, returning how many were revoked
    async fn revoke_all_for_identity(&self, identity_id: Uuid) -> StoreResult<u64>;

    /// Whether multi-record transactions are currently available
    ///
    /// Callers probe this per operation; the answer can change at runtime
    /// (failover, topology change).
    async fn supports_transactions(&self) -> bool;

    /// Atomically revoke `predecessor_id` and create its successor
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Aborted` without applying any change if the
    /// predecessor is no longer active or the transaction cannot commit.
    async fn rotate(
        &self,
        predecessor_id: Uuid,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord>;
}
