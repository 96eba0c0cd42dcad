//! PostgreSQL tree store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_entity::folder::{Folder, FolderType};
use pgeo_entity::layer::Layer;
use pgeo_entity::owner::Owner;

use crate::repositories::{
    FolderRepository, FolderTypeRepository, LayerRepository, ReferenceRepository,
};
use crate::store::{FolderFilter, ReferenceKind, TreeStore, TreeTransaction};

/// Tree store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgTreeStore {
    pool: PgPool,
}

impl PgTreeStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TreeStore for PgTreeStore {
    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgTreeTransaction { tx }))
    }
}

/// A database transaction. Dropping it without commit rolls it back.
pub struct PgTreeTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TreeTransaction for PgTreeTransaction {
    async fn reference_exists(&mut self, kind: ReferenceKind, id: Uuid) -> AppResult<bool> {
        ReferenceRepository::exists(&mut *self.tx, kind, id).await
    }

    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>> {
        FolderRepository::find_by_id(&mut *self.tx, id).await
    }

    async fn find_root_by_owner(&mut self, owner: Owner) -> AppResult<Option<Folder>> {
        FolderRepository::find_root_by_owner(&mut *self.tx, owner).await
    }

    async fn find_children(&mut self, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        FolderRepository::find_children(&mut *self.tx, parent_id).await
    }

    async fn find_folders(&mut self, filter: &FolderFilter) -> AppResult<Vec<Folder>> {
        FolderRepository::find_filtered(&mut *self.tx, filter).await
    }

    async fn upsert_folder(&mut self, folder: &Folder) -> AppResult<Folder> {
        FolderRepository::upsert(&mut *self.tx, folder).await
    }

    async fn delete_folder(&mut self, id: Uuid) -> AppResult<bool> {
        FolderRepository::delete(&mut *self.tx, id).await
    }

    async fn find_layer(&mut self, id: Uuid) -> AppResult<Option<Layer>> {
        LayerRepository::find_by_id(&mut *self.tx, id).await
    }

    async fn find_layers_by_folder(&mut self, folder_id: Uuid) -> AppResult<Vec<Layer>> {
        LayerRepository::find_by_folder(&mut *self.tx, folder_id).await
    }

    async fn upsert_layer(&mut self, layer: &Layer) -> AppResult<Layer> {
        LayerRepository::upsert(&mut *self.tx, layer).await
    }

    async fn delete_layer(&mut self, id: Uuid) -> AppResult<bool> {
        LayerRepository::delete(&mut *self.tx, id).await
    }

    async fn list_folder_types(&mut self) -> AppResult<Vec<FolderType>> {
        FolderTypeRepository::find_all(&mut *self.tx).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}
