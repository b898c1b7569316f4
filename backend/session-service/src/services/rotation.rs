/// Refresh token rotation strategies
///
/// The strategy is picked per call from the refresh store's capability probe:
///
/// - **Transactional**: successor creation and predecessor revocation commit
///   together through [`RefreshTokenStore::rotate`]. A rollback leaves the
///   predecessor active.
/// - **BestEffort**: create the successor, then revoke the predecessor as a
///   separate step. A failed revoke is logged and tolerated, so both tokens can
///   stay active until the predecessor expires.
use crate::error::Cause;
use crate::models::RefreshTokenRecord;
use crate::store::RefreshTokenStore;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStrategy {
    Transactional,
    BestEffort,
}

impl RotationStrategy {
    pub fn from_capability(supports_transactions: bool) -> Self {
        if supports_transactions {
            RotationStrategy::Transactional
        } else {
            RotationStrategy::BestEffort
        }
    }

    /// Ask the store which strategy applies right now
    pub async fn probe(store: &dyn RefreshTokenStore) -> Self {
        Self::from_capability(store.supports_transactions().await)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStrategy::Transactional => "transactional",
            RotationStrategy::BestEffort => "best_effort",
        }
    }

    /// Replace `predecessor` with a new record for `successor_raw`
    pub(crate) async fn rotate(
        self,
        store: &dyn RefreshTokenStore,
        predecessor: &RefreshTokenRecord,
        successor_raw: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, Cause> {
        match self {
            RotationStrategy::Transactional => store
                .rotate(
                    predecessor.id,
                    predecessor.identity_id,
                    successor_raw,
                    expires_at,
                )
                .await
                .map_err(Cause::RotationAborted),
            RotationStrategy::BestEffort => {
                let successor = store
                    .create(predecessor.identity_id, successor_raw, expires_at)
                    .await
                    .map_err(Cause::Store)?;

                if let Err(e) = store.revoke(predecessor.id).await {
                    warn!(
                        identity_id = %predecessor.identity_id,
                        predecessor_id = %predecessor.id,
                        successor_id = %successor.id,
                        error = %e,
                        "Failed to revoke rotated refresh token; predecessor stays active until expiry"
                    );
                } else {
                    debug!(
                        predecessor_id = %predecessor.id,
                        successor_id = %successor.id,
                        "Rotated refresh token without transaction"
                    );
                }

                Ok(successor)
            }
        }
    }
}
