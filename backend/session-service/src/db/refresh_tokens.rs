/// Refresh token database operations
use crate::models::RefreshTokenRecord;
use crate::security::hash_refresh_token;
use crate::store::{RefreshTokenStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

/// PostgreSQL refresh token gateway
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete records whose expiry has passed (maintenance operation)
    pub async fn purge_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_record(
        tx: &mut Transaction<'_, Postgres>,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let record =
            RefreshTokenRecord::new(identity_id, hash_refresh_token(raw_token), expires_at);

        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (id, identity_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, identity_id, token_hash, expires_at, created_at, revoked_at
            "#,
        )
        .bind(record.id)
        .bind(record.identity_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.created_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn create(
        &self,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let mut tx = self.pool.begin().await?;
        let record = Self::insert_record(&mut tx, identity_id, raw_token, expires_at).await?;
        tx.commit().await?;

        Ok(record)
    }

    async fn find_active(&self, raw_token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, identity_id, token_hash, expires_at, created_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(hash_refresh_token(raw_token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke(&self, record_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1
            WHERE id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_all_for_identity(&self, identity_id: Uuid) -> StoreResult<u64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1
            WHERE identity_id = $2 AND revoked_at IS NULL AND expires_at > $1
            "#,
        )
        .bind(now)
        .bind(identity_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Writable primaries support transactions; hot standbys and
    /// unreachable servers report degraded mode
    async fn supports_transactions(&self) -> bool {
        match sqlx::query_scalar::<_, bool>("SELECT pg_is_in_recovery()")
            .fetch_one(&self.pool)
            .await
        {
            Ok(in_recovery) => !in_recovery,
            Err(e) => {
                warn!(error = %e, "Transaction capability probe failed");
                false
            }
        }
    }

    async fn rotate(
        &self,
        predecessor_id: Uuid,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here serializes concurrent rotations of one token
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1
            WHERE id = $2 AND revoked_at IS NULL AND expires_at > $1
            "#,
        )
        .bind(Utc::now())
        .bind(predecessor_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(record_id = %predecessor_id, "Rotation aborted, predecessor not active");
            return Err(StoreError::Aborted(
                "predecessor is no longer active".to_string(),
            ));
        }

        let successor = Self::insert_record(&mut tx, identity_id, raw_token, expires_at)
            .await
            .map_err(|e| StoreError::Aborted(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Aborted(e.to_string()))?;

        Ok(successor)
    }
}
