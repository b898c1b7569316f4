/// Maintenance commands for the session store
///
/// Usage:
/// ```bash
/// cargo run --bin session-maintenance -- <COMMAND>
/// ```
///
/// Commands:
/// - `check-config`: Load and validate session settings, then exit
/// - `migrate`: Apply pending database migrations
/// - `purge-expired`: Delete refresh token records past their expiry
use anyhow::{bail, Context, Result};
use session_service::config::{DatabaseSettings, Settings};
use session_service::db::{self, PgRefreshTokenStore};
use session_service::logging::init_tracing;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    CheckConfig,
    Migrate,
    PurgeExpired,
}

impl Command {
    fn parse(arg: &str) -> Result<Self> {
        match arg {
            "check-config" => Ok(Command::CheckConfig),
            "migrate" => Ok(Command::Migrate),
            "purge-expired" => Ok(Command::PurgeExpired),
            other => bail!(
                "Unknown command '{}'. Expected one of: check-config, migrate, purge-expired",
                other
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let arg = std::env::args()
        .nth(1)
        .context("Missing command. Expected one of: check-config, migrate, purge-expired")?;
    let command = Command::parse(&arg)?;

    let settings = Settings::load().context("Failed to load session settings")?;
    settings
        .validate()
        .context("Session settings failed validation")?;
    info!(?settings, "Session settings are valid");

    if command == Command::CheckConfig {
        return Ok(());
    }

    let database = DatabaseSettings::from_env()?;
    let pool = db::create_pool(&database)
        .await
        .context("Failed to connect to database")?;

    match command {
        Command::Migrate => {
            db::MIGRATOR
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Migrations applied");
        }
        Command::PurgeExpired => {
            let purged = PgRefreshTokenStore::new(pool)
                .purge_expired()
                .await
                .context("Failed to purge expired refresh tokens")?;
            info!(purged, "Expired refresh tokens purged");
        }
        Command::CheckConfig => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("migrate").unwrap(), Command::Migrate);
        assert_eq!(Command::parse("purge-expired").unwrap(), Command::PurgeExpired);
        assert_eq!(Command::parse("check-config").unwrap(), Command::CheckConfig);
        assert!(Command::parse("drop-all").is_err());
    }
}
