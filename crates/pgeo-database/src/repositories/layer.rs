//! Layer repository implementation.

use sqlx::PgConnection;
use uuid::Uuid;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_entity::layer::Layer;

/// Layer CRUD queries.
#[derive(Debug, Clone, Copy)]
pub struct LayerRepository;

impl LayerRepository {
    /// Find a layer by ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Layer>> {
        sqlx::query_as::<_, Layer>("SELECT * FROM layers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find layer", e))
    }

    /// List the layers of a folder.
    pub async fn find_by_folder(conn: &mut PgConnection, folder_id: Uuid) -> AppResult<Vec<Layer>> {
        sqlx::query_as::<_, Layer>(
            "SELECT * FROM layers WHERE folder_id = $1 \
             ORDER BY layer_order ASC NULLS LAST, name ASC, created_at ASC",
        )
        .bind(folder_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list folder layers", e)
        })
    }

    /// Insert a layer or replace every field of an existing one.
    pub async fn upsert(conn: &mut PgConnection, layer: &Layer) -> AppResult<Layer> {
        sqlx::query_as::<_, Layer>(
            "INSERT INTO layers (id, name, title, folder_id, user_id, group_id, layer_type, \
             workspace, server_resource, table_name, style_name, geometry_type, layer_order, \
             enabled, published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, title = EXCLUDED.title, folder_id = EXCLUDED.folder_id, \
             user_id = EXCLUDED.user_id, group_id = EXCLUDED.group_id, \
             layer_type = EXCLUDED.layer_type, workspace = EXCLUDED.workspace, \
             server_resource = EXCLUDED.server_resource, table_name = EXCLUDED.table_name, \
             style_name = EXCLUDED.style_name, geometry_type = EXCLUDED.geometry_type, \
             layer_order = EXCLUDED.layer_order, enabled = EXCLUDED.enabled, \
             published = EXCLUDED.published, created_at = EXCLUDED.created_at, \
             updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(layer.id)
        .bind(&layer.name)
        .bind(&layer.title)
        .bind(layer.folder_id)
        .bind(layer.user_id)
        .bind(layer.group_id)
        .bind(&layer.layer_type)
        .bind(&layer.workspace)
        .bind(&layer.server_resource)
        .bind(&layer.table_name)
        .bind(&layer.style_name)
        .bind(&layer.geometry_type)
        .bind(layer.layer_order)
        .bind(layer.enabled)
        .bind(layer.published)
        .bind(layer.created_at)
        .bind(layer.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save layer", e))
    }

    /// Delete a layer.
    pub async fn delete(conn: &mut PgConnection, layer_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM layers WHERE id = $1")
            .bind(layer_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete layer", e))?;
        Ok(result.rows_affected() > 0)
    }
}
