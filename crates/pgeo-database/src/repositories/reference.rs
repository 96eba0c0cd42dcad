//! Existence checks for referenced records.

use sqlx::PgConnection;
use uuid::Uuid;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;

use crate::store::ReferenceKind;

/// Resolves ids of users, groups, zones, types, authorities and folders.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRepository;

impl ReferenceRepository {
    /// Whether a record of `kind` with `id` exists.
    pub async fn exists(conn: &mut PgConnection, kind: ReferenceKind, id: Uuid) -> AppResult<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", kind.table());
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to resolve {kind} reference"),
                    e,
                )
            })
    }
}
