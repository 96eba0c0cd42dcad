//! Spatial tables backing vectorial layers.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;

/// Copy and drop the tables that vectorial layers are published from.
#[async_trait]
pub trait SpatialTableStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create `target` with the structure and rows of `source`.
    async fn copy_table(&self, source: &str, target: &str) -> AppResult<()>;

    /// Drop a table if it exists.
    async fn drop_table(&self, table: &str) -> AppResult<()>;

    /// Whether a table exists.
    async fn table_exists(&self, table: &str) -> AppResult<bool>;
}

/// Table store on the PostGIS database the catalog's datastores point at.
#[derive(Debug, Clone)]
pub struct PostgisTableStore {
    pool: PgPool,
}

impl PostgisTableStore {
    /// Create a table store over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpatialTableStore for PostgisTableStore {
    async fn copy_table(&self, source: &str, target: &str) -> AppResult<()> {
        let sql = format!(
            "CREATE TABLE {} AS TABLE {}",
            quote_identifier(target)?,
            quote_identifier(source)?
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to copy table", e))?;
        info!(source, target, "Spatial table copied");
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> AppResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_identifier(table)?);
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to drop table", e))?;
        info!(table, "Spatial table dropped");
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> AppResult<bool> {
        quote_identifier(table)?;
        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) => (schema, name),
            None => ("public", table),
        };
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(schema)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check table", e))
    }
}

/// Quote a possibly schema-qualified table name.
///
/// Only ASCII alphanumerics and `_` are allowed in each part, so names
/// taken from catalog responses can never smuggle SQL.
pub fn quote_identifier(name: &str) -> AppResult<String> {
    let parts: Vec<&str> = name.split('.').collect();
    let valid = parts.len() <= 2
        && parts.iter().all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(AppError::validation(format!("Invalid table name '{name}'")));
    }
    Ok(parts
        .iter()
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}
