//! Layer CRUD operations.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use pgeo_cache::RootFolderCache;
use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_database::{ReferenceKind, TreeStore};
use pgeo_entity::catalog::ResourceKind;
use pgeo_entity::layer::Layer;

use crate::folder::unit::TreeUnitOfWork;

/// Manages the layers held by folders.
///
/// A layer write changes the classification of its folder, so every
/// write invalidates the cached root of the tree holding it.
#[derive(Debug, Clone)]
pub struct LayerService {
    /// Tree store.
    store: Arc<dyn TreeStore>,
    /// Cache of materialized root folders.
    cache: RootFolderCache,
}

impl LayerService {
    /// Creates a new layer service.
    pub fn new(store: Arc<dyn TreeStore>, cache: RootFolderCache) -> Self {
        Self { store, cache }
    }

    /// Gets a layer by ID.
    pub async fn get_layer(&self, layer_id: Uuid) -> AppResult<Layer> {
        let mut tx = self.store.begin().await?;
        let layer = tx
            .find_layer(layer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Layer {layer_id} not found")))?;
        tx.commit().await?;
        Ok(layer)
    }

    /// Lists the layers of a folder in store order.
    pub async fn layers_by_folder(&self, folder_id: Uuid) -> AppResult<Vec<Layer>> {
        let mut tx = self.store.begin().await?;
        let layers = tx.find_layers_by_folder(folder_id).await?;
        tx.commit().await?;
        Ok(layers)
    }

    /// Inserts the layer if its id is unknown, otherwise replaces every
    /// field of the stored record.
    pub async fn save_layer(&self, layer: &Layer) -> AppResult<Layer> {
        let mut unit = TreeUnitOfWork::begin(self.store.as_ref(), &self.cache, "save_layer").await?;
        let result = save_in(&mut unit, layer).await;
        let saved = unit.finish(result).await?;
        info!(
            layer_id = %saved.id,
            folder_id = %saved.folder_id,
            name = %saved.name,
            "Layer saved"
        );
        Ok(saved)
    }

    /// Deletes a layer. Returns `false` when it did not exist.
    pub async fn delete_layer(&self, layer_id: Uuid) -> AppResult<bool> {
        let mut unit =
            TreeUnitOfWork::begin(self.store.as_ref(), &self.cache, "delete_layer").await?;
        let found = unit.tx().find_layer(layer_id).await;
        let result = match found {
            Ok(Some(layer)) => unit.delete_layer(&layer).await,
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };
        let deleted = unit.finish(result).await?;
        if deleted {
            info!(layer_id = %layer_id, "Layer deleted");
        }
        Ok(deleted)
    }
}

async fn save_in(unit: &mut TreeUnitOfWork, layer: &Layer) -> AppResult<Layer> {
    if layer.name.trim().is_empty() {
        return Err(AppError::validation("Layer name cannot be empty"));
    }
    if let Some(tag) = layer.layer_type.as_deref() {
        tag.parse::<ResourceKind>()?;
    }
    let owner = layer
        .owner()
        .ok_or_else(|| AppError::validation("Layer must belong to a user or a group"))?;
    unit.require(ReferenceKind::of_owner(&owner), owner.id())
        .await?;
    unit.require(ReferenceKind::Folder, layer.folder_id).await?;

    let existing = unit.tx().find_layer(layer.id).await?;
    if let Some(old) = &existing {
        // The folder it leaves changes classification too.
        unit.touch_layer(old).await?;
    }

    let record = Layer {
        created_at: existing
            .as_ref()
            .map(|l| l.created_at)
            .unwrap_or(layer.created_at),
        updated_at: Utc::now(),
        ..layer.clone()
    };
    unit.upsert_layer(&record).await
}
