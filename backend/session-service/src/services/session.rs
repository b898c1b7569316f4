/// Session lifecycle manager
///
/// Issues, rotates and revokes sessions for registered identities:
/// - Sign-up / sign-in with Argon2id credentials
/// - Short-lived HS256 access tokens
/// - Opaque refresh tokens stored only as SHA-256 hashes
/// - Refresh rotation, transactional when the store allows it
///
/// Failures are logged with their detailed cause and returned as a
/// [`SessionError`] with a fixed message.
use crate::config::Settings;
use crate::error::{Cause, Operation, Result};
use crate::models::{
    AuthSession, Identity, RefreshTokenRecord, RefreshedTokens, Registration, TOKEN_TYPE_BEARER,
};
use crate::security::{generate_refresh_token, hash_password, verify_password, Claims, TokenCodec};
use crate::services::rotation::RotationStrategy;
use crate::store::{IdentityStore, RefreshTokenStore, StoreError};
use crate::validators::{normalize_email, password_policy_violation};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Plaintext behind the unknown-email dummy hash
const DUMMY_PASSWORD: &str = "session-service-dummy-credential";

/// Stateless coordinator over the identity and refresh token stores
///
/// Holds no locks; share it behind an `Arc`.
#[derive(Clone)]
pub struct SessionManager {
    identities: Arc<dyn IdentityStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    codec: TokenCodec,
    refresh_ttl: Duration,
    rotation_enabled: bool,
    hash_cost: u32,
    /// Verified against on unknown-email sign-ins so both failure paths cost one Argon2 run
    dummy_hash: String,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("rotation_enabled", &self.rotation_enabled)
            .field("hash_cost", &self.hash_cost)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Build a manager from validated settings
    ///
    /// ## Errors
    ///
    /// - `UnsupportedAlgorithm` if the configured algorithm is not HS256
    /// - `HashingFailure` if the hash cost is out of range
    pub fn new(
        settings: &Settings,
        identities: Arc<dyn IdentityStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self> {
        let codec = settings.jwt.codec()?;
        let dummy_hash = hash_password(DUMMY_PASSWORD, settings.password.hash_cost)
            .map_err(|e| Cause::from(e).coalesce(Operation::Startup))?;

        info!(
            rotation_enabled = settings.refresh_token.rotation_enabled,
            access_token_ttl_seconds = settings.jwt.access_token_ttl_seconds,
            refresh_token_ttl_seconds = settings.refresh_token.ttl_seconds,
            "Session manager initialized"
        );

        Ok(Self {
            identities,
            refresh_tokens,
            codec,
            refresh_ttl: settings.refresh_token.ttl(),
            rotation_enabled: settings.refresh_token.rotation_enabled,
            hash_cost: settings.password.hash_cost,
            dummy_hash,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new identity and open its first session
    ///
    /// The refresh token is omitted when its record could not be stored.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Registration> {
        self.try_sign_up(email, password)
            .await
            .map_err(|cause| cause.coalesce(Operation::SignUp))
    }

    /// Authenticate with email and password and open a new session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.try_sign_in(email, password)
            .await
            .map_err(|cause| cause.coalesce(Operation::SignIn))
    }

    /// Exchange a refresh token for a new access token
    ///
    /// With rotation enabled the presented token is replaced and must not be
    /// used again; otherwise it is returned unchanged.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<RefreshedTokens> {
        self.try_refresh(raw_refresh_token)
            .await
            .map_err(|cause| cause.coalesce(Operation::Refresh))
    }

    /// Revoke one refresh token owned by `identity_id`
    pub async fn sign_out(&self, identity_id: Uuid, raw_refresh_token: &str) -> Result<()> {
        self.try_sign_out(identity_id, raw_refresh_token)
            .await
            .map_err(|cause| cause.coalesce(Operation::SignOut))
    }

    /// Revoke every active refresh token of an identity
    ///
    /// Returns the number of tokens revoked; zero is not an error.
    pub async fn sign_out_all(&self, identity_id: Uuid) -> Result<u64> {
        let revoked = self
            .refresh_tokens
            .revoke_all_for_identity(identity_id)
            .await
            .map_err(|e| Cause::Store(e).coalesce(Operation::SignOutAll))?;

        info!(identity_id = %identity_id, revoked, "Signed out all sessions");
        Ok(revoked)
    }

    /// Verify an access token issued by this manager
    pub fn authenticate(&self, access_token: &str) -> Result<Claims> {
        self.codec
            .verify(access_token)
            .map_err(|e| Cause::Codec(e).coalesce(Operation::Authenticate))
    }

    async fn try_sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Registration, Cause> {
        let email = normalize_email(email);

        if self.identities.find_by_email(&email).await?.is_some() {
            return Err(Cause::EmailTaken);
        }

        if let Some(rule) = password_policy_violation(password) {
            return Err(Cause::WeakPassword(rule));
        }

        let password_hash = hash_password(password, self.hash_cost)?;
        let identity = Identity::new(email, password_hash);

        self.identities
            .create(&identity)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey => Cause::DuplicateKey,
                other => Cause::Store(other),
            })?;

        let access_token = self.codec.mint(identity.id, &identity.email)?;

        let refresh_token = match self.issue_refresh_token(identity.id).await {
            Ok((raw, _)) => Some(raw),
            Err(e) => {
                warn!(
                    identity_id = %identity.id,
                    error = %e,
                    "Failed to store initial refresh token; registration continues without one"
                );
                None
            }
        };

        info!(identity_id = %identity.id, "Identity registered");

        Ok(Registration {
            identity: identity.to_public(),
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.codec.access_ttl().num_seconds(),
        })
    }

    async fn try_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthSession, Cause> {
        let email = normalize_email(email);

        let Some(identity) = self.identities.find_by_email(&email).await? else {
            let _ = verify_password(password, &self.dummy_hash);
            return Err(Cause::UnknownEmail);
        };

        verify_password(password, &identity.password_hash)?;

        let access_token = self.codec.mint(identity.id, &identity.email)?;
        let (refresh_token, record) = self.issue_refresh_token(identity.id).await?;

        info!(
            identity_id = %identity.id,
            refresh_token_id = %record.id,
            "Identity signed in"
        );

        Ok(AuthSession {
            identity: identity.to_public(),
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.codec.access_ttl().num_seconds(),
        })
    }

    async fn try_refresh(
        &self,
        raw_refresh_token: &str,
    ) -> std::result::Result<RefreshedTokens, Cause> {
        let record = self
            .refresh_tokens
            .find_active(raw_refresh_token)
            .await?
            .ok_or(Cause::TokenNotActive)?;

        let identity = self
            .identities
            .find_by_id(record.identity_id)
            .await?
            .ok_or(Cause::IdentityMissing)?;

        let access_token = self.codec.mint(identity.id, &identity.email)?;

        let refresh_token = if self.rotation_enabled {
            let successor_raw = generate_refresh_token();
            let strategy = RotationStrategy::probe(self.refresh_tokens.as_ref()).await;
            let successor = strategy
                .rotate(
                    self.refresh_tokens.as_ref(),
                    &record,
                    &successor_raw,
                    Utc::now() + self.refresh_ttl,
                )
                .await?;

            info!(
                identity_id = %identity.id,
                predecessor_id = %record.id,
                successor_id = %successor.id,
                strategy = strategy.as_str(),
                "Refresh token rotated"
            );
            successor_raw
        } else {
            raw_refresh_token.to_string()
        };

        Ok(RefreshedTokens {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.codec.access_ttl().num_seconds(),
        })
    }

    async fn try_sign_out(
        &self,
        identity_id: Uuid,
        raw_refresh_token: &str,
    ) -> std::result::Result<(), Cause> {
        let record = self
            .refresh_tokens
            .find_active(raw_refresh_token)
            .await?
            .ok_or(Cause::TokenNotActive)?;

        if record.identity_id != identity_id {
            return Err(Cause::OwnerMismatch);
        }

        self.refresh_tokens.revoke(record.id).await?;

        info!(identity_id = %identity_id, refresh_token_id = %record.id, "Signed out");
        Ok(())
    }

    async fn issue_refresh_token(
        &self,
        identity_id: Uuid,
    ) -> std::result::Result<(String, RefreshTokenRecord), StoreError> {
        let raw = generate_refresh_token();
        let record = self
            .refresh_tokens
            .create(identity_id, &raw, Utc::now() + self.refresh_ttl)
            .await?;
        Ok((raw, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JwtSettings, PasswordSettings, RefreshTokenSettings};
    use crate::error::SessionError;
    use crate::security::PasswordError;
    use crate::store::{MemoryIdentityStore, MemoryRefreshTokenStore};

    fn settings(rotation_enabled: bool) -> Settings {
        Settings {
            jwt: JwtSettings {
                secret: "unit-test-secret".to_string(),
                algorithm: "HS256".to_string(),
                access_token_ttl_seconds: 900,
            },
            refresh_token: RefreshTokenSettings {
                ttl_seconds: 3600,
                rotation_enabled,
            },
            password: PasswordSettings { hash_cost: 1 },
        }
    }

    fn manager(rotation_enabled: bool) -> SessionManager {
        SessionManager::new(
            &settings(rotation_enabled),
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryRefreshTokenStore::new()),
        )
        .expect("valid settings")
    }

    #[test]
    fn test_new_rejects_unsupported_algorithm() {
        let mut settings = settings(true);
        settings.jwt.algorithm = "HS512".to_string();

        let result = SessionManager::new(
            &settings,
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryRefreshTokenStore::new()),
        );
        assert_eq!(result.err(), Some(SessionError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_new_rejects_zero_cost() {
        let mut settings = settings(true);
        settings.password.hash_cost = 0;

        let result = SessionManager::new(
            &settings,
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryRefreshTokenStore::new()),
        );
        assert_eq!(result.err(), Some(SessionError::HashingFailure));
    }

    #[tokio::test]
    async fn test_weak_password_is_registration_failure() {
        let manager = manager(true);
        let result = manager.sign_up("weak@example.com", "password").await;
        assert_eq!(result.err(), Some(SessionError::RegistrationFailed));
    }

    #[tokio::test]
    async fn test_authenticate_round_trip() {
        let manager = manager(true);
        let registration = manager
            .sign_up("Auth@Example.com", "Password123")
            .await
            .unwrap();

        let claims = manager.authenticate(&registration.access_token).unwrap();
        assert_eq!(claims.email, "auth@example.com");
        assert_eq!(claims.subject_id().unwrap(), registration.identity.id);

        assert_eq!(
            manager.authenticate("garbage").err(),
            Some(SessionError::TokenInvalid)
        );
    }

    #[tokio::test]
    async fn test_unknown_email_runs_password_verification() {
        let manager = manager(true);

        // The dummy hash is a real Argon2id hash at the configured cost
        assert!(manager.dummy_hash.starts_with("$argon2id$"));
        assert!(manager.dummy_hash.contains("t=1"));
        assert_eq!(
            verify_password("Password123", &manager.dummy_hash),
            Err(PasswordError::Mismatch)
        );

        let result = manager.sign_in("nobody@example.com", "Password123").await;
        assert_eq!(result.err(), Some(SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_expires_in_matches_access_ttl() {
        let manager = manager(false);
        let registration = manager.sign_up("ttl@example.com", "Password123").await.unwrap();
        assert_eq!(registration.expires_in, 900);
        assert_eq!(registration.token_type, TOKEN_TYPE_BEARER);
    }
}
