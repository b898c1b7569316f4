/// PostgreSQL store gateways for session service
use crate::config::DatabaseSettings;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

pub mod identities;
pub mod refresh_tokens;

pub use identities::PgIdentityStore;
pub use refresh_tokens::PgRefreshTokenStore;

/// Schema migrations for identities and refresh tokens
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a PostgreSQL connection pool from settings
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await?;

    info!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "Database pool created"
    );

    Ok(pool)
}
