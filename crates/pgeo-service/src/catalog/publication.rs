//! Keeps layer records in line with what the catalog holds.
//!
//! Catalog calls never run inside a store transaction: the layer is read
//! first, the catalog sequence runs, and only a successful outcome is
//! written back in a fresh unit of work.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use pgeo_cache::RootFolderCache;
use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_database::TreeStore;
use pgeo_entity::catalog::{DuplicationRequest, DuplicationResult, ResourceKind};
use pgeo_entity::layer::Layer;

use super::sync::CatalogSyncEngine;
use crate::folder::unit::TreeUnitOfWork;

/// Publishes and unpublishes stored layers.
#[derive(Debug, Clone)]
pub struct PublicationService {
    /// Tree store.
    store: Arc<dyn TreeStore>,
    /// Cache of materialized root folders.
    cache: RootFolderCache,
    /// Catalog sequences.
    sync: CatalogSyncEngine,
}

impl PublicationService {
    /// Creates a new publication service.
    pub fn new(store: Arc<dyn TreeStore>, cache: RootFolderCache, sync: CatalogSyncEngine) -> Self {
        Self { store, cache, sync }
    }

    /// Duplicates the catalog resource of a layer into `target_workspace`
    /// and, on success, records the layer as published there.
    ///
    /// A layer whose type, workspace or catalog name cannot form a request
    /// yields `Failure` without contacting the catalog.
    pub async fn duplicate_layer_publication(
        &self,
        layer_id: Uuid,
        target_workspace: &str,
        new_name: &str,
        new_title: &str,
    ) -> AppResult<DuplicationResult> {
        let layer = self.read_layer(layer_id).await?;
        let request = match duplication_request(&layer, target_workspace, new_name, new_title) {
            Ok(request) => request,
            Err(e) => {
                warn!(layer_id = %layer_id, error = %e, "Layer cannot be duplicated");
                return Ok(DuplicationResult::Failure);
            }
        };

        let result = self.sync.duplicate_layer(&request).await;
        if !result.is_success() {
            return Ok(result);
        }

        let mut unit =
            TreeUnitOfWork::begin(self.store.as_ref(), &self.cache, "record_publication").await?;
        let recorded = record_publication(&mut unit, layer_id, &request).await;
        if let Err(e) = unit.finish(recorded).await {
            warn!(
                layer_id = %layer_id,
                workspace = target_workspace,
                name = new_name,
                error = %e,
                "Layer duplicated in catalog but not recorded"
            );
            return Err(e);
        }
        info!(layer_id = %layer_id, workspace = target_workspace, name = new_name, "Layer publication recorded");
        Ok(result)
    }

    /// Removes the catalog resource of a layer and, on success, marks the
    /// layer as unpublished. Returns whether the catalog call succeeded.
    ///
    /// Only a published layer owns its catalog resource; anything else,
    /// copies included, is rejected before the catalog is contacted.
    pub async fn unpublish_layer(&self, layer_id: Uuid) -> AppResult<bool> {
        let layer = self.read_layer(layer_id).await?;
        if !layer.published {
            return Err(AppError::validation(format!(
                "Layer {layer_id} is not published"
            )));
        }
        let kind = layer.resource_kind()?;
        let workspace = layer.workspace.as_deref().ok_or_else(|| {
            AppError::validation(format!("Layer {layer_id} has no catalog workspace"))
        })?;
        let name = layer.server_resource.as_deref().unwrap_or(&layer.name);

        if !self
            .sync
            .delete_layer(workspace, name, kind, layer.table_name.as_deref())
            .await
        {
            return Ok(false);
        }

        let mut unit =
            TreeUnitOfWork::begin(self.store.as_ref(), &self.cache, "record_unpublish").await?;
        let recorded = record_unpublish(&mut unit, layer_id).await;
        unit.finish(recorded).await?;
        info!(layer_id = %layer_id, workspace, name, "Layer unpublished");
        Ok(true)
    }

    async fn read_layer(&self, layer_id: Uuid) -> AppResult<Layer> {
        let mut tx = self.store.begin().await?;
        let layer = tx.find_layer(layer_id).await?;
        tx.commit().await?;
        layer.ok_or_else(|| AppError::not_found(format!("Layer {layer_id} not found")))
    }
}

fn duplication_request(
    layer: &Layer,
    target_workspace: &str,
    new_name: &str,
    new_title: &str,
) -> AppResult<DuplicationRequest> {
    let layer_type = layer
        .layer_type
        .as_deref()
        .ok_or_else(|| AppError::validation(format!("Layer {} has no resource type", layer.id)))?;
    let workspace = layer.workspace.clone().ok_or_else(|| {
        AppError::validation(format!("Layer {} has no catalog workspace", layer.id))
    })?;
    let source_name = layer
        .server_resource
        .clone()
        .unwrap_or_else(|| layer.name.clone());

    DuplicationRequest::from_tag(
        workspace,
        layer_type,
        source_name,
        layer.table_name.clone(),
        target_workspace,
        new_name,
        new_title,
    )
}

async fn record_publication(
    unit: &mut TreeUnitOfWork,
    layer_id: Uuid,
    request: &DuplicationRequest,
) -> AppResult<()> {
    let mut layer = unit
        .tx()
        .find_layer(layer_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Layer {layer_id} not found")))?;

    let kind = request.source.kind();
    layer.workspace = Some(request.target_workspace.clone());
    layer.server_resource = Some(request.new_name.clone());
    layer.title = Some(request.new_title.clone());
    if kind == ResourceKind::Vectorial {
        layer.table_name = Some(request.new_name.clone());
    }
    if kind != ResourceKind::Remote {
        layer.style_name = Some(request.new_name.clone());
    }
    layer.published = true;
    layer.updated_at = Utc::now();

    unit.upsert_layer(&layer).await?;
    Ok(())
}

async fn record_unpublish(unit: &mut TreeUnitOfWork, layer_id: Uuid) -> AppResult<()> {
    let Some(mut layer) = unit.tx().find_layer(layer_id).await? else {
        return Ok(());
    };
    layer.published = false;
    layer.updated_at = Utc::now();
    unit.upsert_layer(&layer).await?;
    Ok(())
}
