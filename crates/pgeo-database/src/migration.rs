//! Schema migrations of the content tree.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every pending migration of the folder, layer and folder type
/// tables.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    info!(known = MIGRATOR.iter().count(), latest, "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Schema migration failed: {e}"), e)
    })?;

    info!(latest, "Schema up to date");
    Ok(())
}
