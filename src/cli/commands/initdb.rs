use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::info;

/// Create or upgrade the schema, then exit.
///
/// Also the first half of `migrate-and-serve`; unlike `serve` this needs
/// no JWT secret, so it can run in provisioning jobs with no app config.
pub async fn init_database(database_url: &str) -> Result<()> {
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("failed to connect to {database_url}"))?;

    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    info!("Database schema is up to date");
    Ok(())
}
