//! Configuration management for Session Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use session_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     settings.validate()?;
//!     println!("Rotation enabled: {}", settings.refresh_token.rotation_enabled);
//!     Ok(())
//! }
//! ```

use crate::error::{Cause, Operation, SessionError};
use crate::security::{password, TokenCodec};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Upper bound for any configured token lifetime (10 years)
const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Session manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub jwt: JwtSettings,
    pub refresh_token: RefreshTokenSettings,
    pub password: PasswordSettings,
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// A `.env` file is read first in debug builds.
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            report_env_file(dotenvy::dotenv());
        }

        Ok(Settings {
            jwt: JwtSettings::from_env()?,
            refresh_token: RefreshTokenSettings::from_env()?,
            password: PasswordSettings::from_env()?,
        })
    }

    /// Startup validation of the signing algorithm and hash cost
    ///
    /// Builds the same codec and hashing parameters the session manager uses,
    /// so a bad value fails here instead of on the first request.
    pub fn validate(&self) -> std::result::Result<(), SessionError> {
        self.jwt.codec()?;
        password::hashing_params(self.password.hash_cost)
            .map_err(|e| Cause::from(e).coalesce(Operation::Startup))?;
        Ok(())
    }
}

/// Access token signing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub algorithm: String,
    pub access_token_ttl_seconds: u64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            secret,
            algorithm: env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            access_token_ttl_seconds: parse_ttl("JWT_ACCESS_TOKEN_TTL_SECONDS", "900")?,
        })
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        ttl_duration(self.access_token_ttl_seconds)
    }

    /// Build the access token codec described by these settings
    pub fn codec(&self) -> std::result::Result<TokenCodec, SessionError> {
        TokenCodec::new(
            self.secret.as_bytes(),
            &self.algorithm,
            self.access_token_ttl(),
        )
        .map_err(|e| Cause::from(e).coalesce(Operation::Startup))
    }
}

/// Refresh token lifetime and rotation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenSettings {
    pub ttl_seconds: u64,
    pub rotation_enabled: bool,
}

impl RefreshTokenSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            ttl_seconds: parse_ttl("REFRESH_TOKEN_TTL_SECONDS", "2592000")?,
            rotation_enabled: env::var("REFRESH_TOKEN_ROTATION_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .trim()
                .parse()
                .context("Invalid REFRESH_TOKEN_ROTATION_ENABLED")?,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        ttl_duration(self.ttl_seconds)
    }
}

/// Password hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordSettings {
    /// Argon2 time cost
    pub hash_cost: u32,
}

impl PasswordSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            hash_cost: env::var("PASSWORD_HASH_COST")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid PASSWORD_HASH_COST")?,
        })
    }
}

/// Database connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Log the outcome of a `.env` load, returning the file that was read
fn report_env_file(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            info!(path = %path.display(), "Loaded .env file for development");
            Some(path)
        }
        Err(e) => {
            debug!(error = %e, "No .env file loaded");
            None
        }
    }
}

fn parse_ttl(key: &str, default: &str) -> Result<u64> {
    let seconds: u64 = env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {}", key))?;

    if seconds > MAX_TTL_SECONDS {
        bail!("{} must not exceed {} seconds", key, MAX_TTL_SECONDS);
    }

    Ok(seconds)
}

fn ttl_duration(seconds: u64) -> chrono::Duration {
    chrono::Duration::seconds(seconds.min(MAX_TTL_SECONDS) as i64)
}
