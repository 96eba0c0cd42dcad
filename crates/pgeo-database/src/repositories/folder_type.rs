//! Folder type repository implementation.

use sqlx::PgConnection;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_entity::folder::FolderType;

/// Read access to the folder type taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct FolderTypeRepository;

impl FolderTypeRepository {
    /// List every folder type.
    pub async fn find_all(conn: &mut PgConnection) -> AppResult<Vec<FolderType>> {
        sqlx::query_as::<_, FolderType>("SELECT * FROM folder_types ORDER BY title ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list folder types", e)
            })
    }
}
