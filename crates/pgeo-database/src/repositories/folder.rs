//! Folder repository implementation.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_entity::folder::Folder;
use pgeo_entity::owner::Owner;

use crate::store::{FolderFilter, ParentFilter, ZoneFilter};

const ORDER_BY: &str = " ORDER BY folder_order ASC NULLS LAST, name ASC, created_at ASC";

/// Folder CRUD and tree queries.
#[derive(Debug, Clone, Copy)]
pub struct FolderRepository;

impl FolderRepository {
    /// Find a folder by ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find the first root folder of an owner.
    pub async fn find_root_by_owner(
        conn: &mut PgConnection,
        owner: Owner,
    ) -> AppResult<Option<Folder>> {
        let column = if owner.is_group() { "group_id" } else { "user_id" };
        let sql = format!(
            "SELECT * FROM folders WHERE {column} = $1 AND parent_id IS NULL{ORDER_BY} LIMIT 1"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(owner.id())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find root folder", e)
            })
    }

    /// List direct children of a folder.
    pub async fn find_children(conn: &mut PgConnection, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        let sql = format!("SELECT * FROM folders WHERE parent_id = $1{ORDER_BY}");
        sqlx::query_as::<_, Folder>(&sql)
            .bind(parent_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// List folders matching a filter.
    pub async fn find_filtered(
        conn: &mut PgConnection,
        filter: &FolderFilter,
    ) -> AppResult<Vec<Folder>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM folders WHERE TRUE");

        match filter.zone {
            ZoneFilter::Any => {}
            ZoneFilter::Unzoned => {
                query.push(" AND zone_id IS NULL");
            }
            ZoneFilter::Zoned => {
                query.push(" AND zone_id IS NOT NULL");
            }
            ZoneFilter::In(zone_id) => {
                query.push(" AND zone_id = ").push_bind(zone_id);
            }
        }

        match filter.parent {
            ParentFilter::Any => {}
            ParentFilter::Root => {
                query.push(" AND parent_id IS NULL");
            }
            ParentFilter::Under(parent_id) => {
                query.push(" AND parent_id = ").push_bind(parent_id);
            }
        }

        if let Some(enabled) = filter.enabled {
            query.push(" AND enabled = ").push_bind(enabled);
        }
        if let Some(folder_type) = filter.folder_type {
            query.push(" AND folder_type_id = ").push_bind(folder_type);
        }
        query.push(ORDER_BY);

        query
            .build_query_as::<Folder>()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query folders", e))
    }

    /// Insert a folder or replace every field of an existing one.
    pub async fn upsert(conn: &mut PgConnection, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, enabled, is_channel, folder_order, user_id, group_id, \
             parent_id, zone_id, folder_type_id, authority_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, enabled = EXCLUDED.enabled, is_channel = EXCLUDED.is_channel, \
             folder_order = EXCLUDED.folder_order, user_id = EXCLUDED.user_id, \
             group_id = EXCLUDED.group_id, parent_id = EXCLUDED.parent_id, \
             zone_id = EXCLUDED.zone_id, folder_type_id = EXCLUDED.folder_type_id, \
             authority_id = EXCLUDED.authority_id, created_at = EXCLUDED.created_at, \
             updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.enabled)
        .bind(folder.is_channel)
        .bind(folder.folder_order)
        .bind(folder.user_id)
        .bind(folder.group_id)
        .bind(folder.parent_id)
        .bind(folder.zone_id)
        .bind(folder.folder_type_id)
        .bind(folder.authority_id)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save folder", e))
    }

    /// Delete a folder. Foreign keys reject folders that still have
    /// children or layers.
    pub async fn delete(conn: &mut PgConnection, folder_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
