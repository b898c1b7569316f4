/// In-process store gateways
///
/// Used by tests and single-node deployments. The refresh token gateway can
/// be switched into degraded mode at runtime to report no transaction support.
/// Expired refresh records stay in memory until
/// [`MemoryRefreshTokenStore::purge_expired`] runs.
use super::{IdentityStore, RefreshTokenStore, StoreError, StoreResult};
use crate::models::{Identity, RefreshTokenRecord};
use crate::security::hash_refresh_token;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Identity gateway backed by concurrent maps
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    by_id: DashMap<Uuid, Identity>,
    by_email: DashMap<String, Uuid>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an identity, returning it if present
    pub fn delete(&self, id: Uuid) -> Option<Identity> {
        let (_, identity) = self.by_id.remove(&id)?;
        self.by_email.remove(&identity.email);
        Some(identity)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, identity: &Identity) -> StoreResult<()> {
        // The email entry guard serializes concurrent registrations of one address
        match self.by_email.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey),
            Entry::Vacant(slot) => {
                self.by_id.insert(identity.id, identity.clone());
                slot.insert(identity.id);
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let Some(id) = self.by_email.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }
}

#[derive(Debug, Default)]
struct RefreshTokenTable {
    by_id: HashMap<Uuid, RefreshTokenRecord>,
    by_hash: HashMap<String, Uuid>,
}

impl RefreshTokenTable {
    fn insert(&mut self, record: RefreshTokenRecord) -> StoreResult<RefreshTokenRecord> {
        if self.by_hash.contains_key(&record.token_hash) {
            return Err(StoreError::DuplicateKey);
        }
        self.by_hash.insert(record.token_hash.clone(), record.id);
        self.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> u64 {
        let expired: Vec<Uuid> = self
            .by_id
            .values()
            .filter(|record| now >= record.expires_at)
            .map(|record| record.id)
            .collect();

        for id in &expired {
            if let Some(record) = self.by_id.remove(id) {
                self.by_hash.remove(&record.token_hash);
            }
        }

        expired.len() as u64
    }

    fn revoke(&mut self, record_id: Uuid, now: DateTime<Utc>) {
        if let Some(record) = self.by_id.get_mut(&record_id) {
            record.revoked_at.get_or_insert(now);
        }
    }
}

/// Refresh token gateway backed by a single locked table
///
/// The lock is held for the whole of each call, which makes [`rotate`] a
/// true atomic unit.
///
/// [`rotate`]: RefreshTokenStore::rotate
#[derive(Debug)]
pub struct MemoryRefreshTokenStore {
    table: Mutex<RefreshTokenTable>,
    transactions: AtomicBool,
}

impl Default for MemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRefreshTokenStore {
    /// Gateway that reports transaction support
    pub fn new() -> Self {
        Self {
            table: Mutex::new(RefreshTokenTable::default()),
            transactions: AtomicBool::new(true),
        }
    }

    /// Gateway that starts in degraded mode
    pub fn without_transactions() -> Self {
        let store = Self::new();
        store.set_transactions_supported(false);
        store
    }

    /// Flip the transaction capability, e.g. to simulate a failover
    pub fn set_transactions_supported(&self, supported: bool) {
        self.transactions.store(supported, Ordering::SeqCst);
    }

    /// Delete records whose expiry has passed (maintenance operation)
    ///
    /// Revoked records are kept until they expire, as in the PostgreSQL gateway.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> u64 {
        self.table.lock().await.purge_expired(now)
    }

    /// Snapshot of every record owned by an identity, newest first
    pub async fn records_for_identity(&self, identity_id: Uuid) -> Vec<RefreshTokenRecord> {
        let table = self.table.lock().await;
        let mut records: Vec<_> = table
            .by_id
            .values()
            .filter(|record| record.identity_id == identity_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create(
        &self,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let record =
            RefreshTokenRecord::new(identity_id, hash_refresh_token(raw_token), expires_at);
        self.table.lock().await.insert(record)
    }

    async fn find_active(&self, raw_token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let token_hash = hash_refresh_token(raw_token);
        let now = Utc::now();
        let table = self.table.lock().await;

        Ok(table
            .by_hash
            .get(&token_hash)
            .and_then(|id| table.by_id.get(id))
            .filter(|record| record.is_active_at(now))
            .cloned())
    }

    async fn revoke(&self, record_id: Uuid) -> StoreResult<()> {
        self.table.lock().await.revoke(record_id, Utc::now());
        Ok(())
    }

    async fn revoke_all_for_identity(&self, identity_id: Uuid) -> StoreResult<u64> {
        let now = Utc::now();
        let mut table = self.table.lock().await;
        let mut revoked = 0;

        for record in table.by_id.values_mut() {
            if record.identity_id == identity_id && record.is_active_at(now) {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }

        Ok(revoked)
    }

    async fn supports_transactions(&self) -> bool {
        self.transactions.load(Ordering::SeqCst)
    }

    async fn rotate(
        &self,
        predecessor_id: Uuid,
        identity_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        if !self.supports_transactions().await {
            return Err(StoreError::Aborted(
                "transactions are not available".to_string(),
            ));
        }

        let now = Utc::now();
        let mut table = self.table.lock().await;

        let predecessor_active = table
            .by_id
            .get(&predecessor_id)
            .is_some_and(|record| record.is_active_at(now));
        if !predecessor_active {
            return Err(StoreError::Aborted(
                "predecessor is no longer active".to_string(),
            ));
        }

        let successor =
            RefreshTokenRecord::new(identity_id, hash_refresh_token(raw_token), expires_at);
        let successor = table
            .insert(successor)
            .map_err(|e| StoreError::Aborted(e.to_string()))?;
        table.revoke(predecessor_id, now);

        Ok(successor)
    }
}
