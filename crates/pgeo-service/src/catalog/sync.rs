//! Multi-step duplicate and delete sequences against the catalog.
//!
//! The catalog is not transactional. A sequence stops at the first failed
//! step and reports [`DuplicationResult::Failure`]; steps that already
//! succeeded stay applied and are only logged.

use std::sync::Arc;

use tracing::{debug, info, warn};

use pgeo_catalog::{CatalogAdapter, RasterPublication, SpatialTableStore, VectorPublication};
use pgeo_core::config::CatalogConfig;
use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_entity::catalog::{DuplicationRequest, DuplicationResult, DuplicationSource, ResourceKind};

/// Drives the catalog adapter and the spatial table store through the
/// per-kind publication sequences.
#[derive(Debug, Clone)]
pub struct CatalogSyncEngine {
    /// Remote catalog.
    pub(super) adapter: Arc<dyn CatalogAdapter>,
    /// Tables backing vectorial layers.
    tables: Arc<dyn SpatialTableStore>,
    /// Catalog settings.
    config: CatalogConfig,
}

impl CatalogSyncEngine {
    /// Creates a new synchronization engine.
    pub fn new(
        adapter: Arc<dyn CatalogAdapter>,
        tables: Arc<dyn SpatialTableStore>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            adapter,
            tables,
            config,
        }
    }

    /// Duplicates a published layer under a new workspace and name.
    pub async fn duplicate_layer(&self, request: &DuplicationRequest) -> DuplicationResult {
        let outcome = match &request.source {
            DuplicationSource::Remote => {
                debug!(
                    source = %request.source_name,
                    "Remote layer has no backing data, nothing to duplicate"
                );
                Ok(DuplicationResult::SuccessRemote)
            }
            DuplicationSource::Vectorial { table } => self
                .duplicate_vectorial(request, table.as_deref())
                .await
                .map(|()| DuplicationResult::SuccessVectorial),
            raster => self
                .duplicate_raster(request, raster.kind())
                .await
                .map(|()| DuplicationResult::SuccessRaster),
        };

        match outcome {
            Ok(result) => {
                info!(
                    source = %format!("{}:{}", request.source_workspace, request.source_name),
                    target = %format!("{}:{}", request.target_workspace, request.new_name),
                    ?result,
                    "Layer duplicated"
                );
                result
            }
            Err(e) => {
                warn!(
                    source = %format!("{}:{}", request.source_workspace, request.source_name),
                    target = %format!("{}:{}", request.target_workspace, request.new_name),
                    kind = %request.source.kind(),
                    error = %e,
                    "Layer duplication failed, completed steps are kept"
                );
                DuplicationResult::Failure
            }
        }
    }

    /// Like [`duplicate_layer`](Self::duplicate_layer) with the source kind
    /// given as a layer type tag. An unknown tag fails without any remote
    /// call.
    #[allow(clippy::too_many_arguments)]
    pub async fn duplicate_by_tag(
        &self,
        source_workspace: &str,
        source_type: &str,
        source_name: &str,
        source_table: Option<&str>,
        target_workspace: &str,
        new_name: &str,
        new_title: &str,
    ) -> DuplicationResult {
        match DuplicationRequest::from_tag(
            source_workspace,
            source_type,
            source_name,
            source_table.map(str::to_string),
            target_workspace,
            new_name,
            new_title,
        ) {
            Ok(request) => self.duplicate_layer(&request).await,
            Err(e) => {
                warn!(source_type, error = %e, "Cannot duplicate layer");
                DuplicationResult::Failure
            }
        }
    }

    /// Removes a published layer and, for vectorial layers, its backing
    /// table. Remote layers need no remote call. Returns whether the
    /// catalog no longer holds the layer.
    pub async fn delete_layer(
        &self,
        workspace: &str,
        name: &str,
        kind: ResourceKind,
        table: Option<&str>,
    ) -> bool {
        if kind == ResourceKind::Remote {
            debug!(workspace, name, "Remote layer, nothing to delete");
            return true;
        }
        match self.try_delete(workspace, name, kind, table).await {
            Ok(()) => true,
            Err(e) => {
                warn!(workspace, name, %kind, error = %e, "Failed to delete layer");
                false
            }
        }
    }

    /// Like [`delete_layer`](Self::delete_layer) with the kind given as a
    /// layer type tag. An unknown tag fails without any remote call.
    pub async fn delete_by_tag(
        &self,
        workspace: &str,
        name: &str,
        layer_type: &str,
        table: Option<&str>,
    ) -> bool {
        match layer_type.parse::<ResourceKind>() {
            Ok(kind) => self.delete_layer(workspace, name, kind, table).await,
            Err(e) => {
                warn!(layer_type, error = %e, "Cannot delete layer");
                false
            }
        }
    }

    async fn duplicate_vectorial(
        &self,
        request: &DuplicationRequest,
        table: Option<&str>,
    ) -> AppResult<()> {
        validate_target(request)?;
        let source = self
            .adapter
            .feature_type(&request.source_workspace, &request.source_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Feature type '{}:{}' not found",
                    request.source_workspace, request.source_name
                ))
            })?;
        let source_table = table
            .map(str::to_string)
            .or_else(|| source.source.clone())
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Feature type '{}:{}' has no backing table",
                    request.source_workspace, request.source_name
                ))
            })?;

        self.ensure_workspace(&request.target_workspace).await?;
        let datastore = self.config.datastore_for(&request.target_workspace);
        self.ensure_datastore(&request.target_workspace, &datastore)
            .await?;

        self.tables
            .copy_table(&source_table, &request.new_name)
            .await?;
        debug!(source = %source_table, target = %request.new_name, "Backing table copied");

        self.adapter
            .publish_vector(&VectorPublication {
                workspace: request.target_workspace.clone(),
                datastore,
                name: request.new_name.clone(),
                title: request.new_title.clone(),
                table: request.new_name.clone(),
                bbox: source.bbox,
                geometry: source.geometry,
            })
            .await?;

        self.restyle(request).await
    }

    async fn duplicate_raster(&self, request: &DuplicationRequest, kind: ResourceKind) -> AppResult<()> {
        validate_target(request)?;
        let store = self
            .adapter
            .coverage_store(&request.source_workspace, &request.source_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Coverage store '{}:{}' not found",
                    request.source_workspace, request.source_name
                ))
            })?;
        if store.kind != kind {
            debug!(requested = %kind, reported = %store.kind, "Coverage store kind differs");
        }
        let file_url = store.source.ok_or_else(|| {
            AppError::validation(format!(
                "Coverage store '{}:{}' has no backing file",
                request.source_workspace, request.source_name
            ))
        })?;
        let crs = self
            .adapter
            .coverage_crs(&request.source_workspace, &request.source_name)
            .await?
            .unwrap_or_else(|| self.config.default_crs.clone());

        self.ensure_workspace(&request.target_workspace).await?;
        self.adapter
            .publish_raster(&RasterPublication {
                workspace: request.target_workspace.clone(),
                name: request.new_name.clone(),
                title: request.new_title.clone(),
                file_url,
                crs,
                kind,
            })
            .await?;

        self.restyle(request).await
    }

    /// Give the copy its own style, cloned from the source layer's.
    async fn restyle(&self, request: &DuplicationRequest) -> AppResult<()> {
        self.adapter
            .copy_style(
                &request.source_workspace,
                &request.source_name,
                &request.new_name,
            )
            .await?;
        self.adapter
            .set_style(&request.target_workspace, &request.new_name, &request.new_name)
            .await
    }

    async fn ensure_workspace(&self, workspace: &str) -> AppResult<()> {
        if !self.adapter.workspace_exists(workspace).await? {
            self.adapter.create_workspace(workspace).await?;
        }
        Ok(())
    }

    async fn ensure_datastore(&self, workspace: &str, datastore: &str) -> AppResult<()> {
        if !self.adapter.datastore_exists(workspace, datastore).await? {
            self.adapter.create_datastore(workspace, datastore).await?;
        }
        Ok(())
    }

    async fn try_delete(
        &self,
        workspace: &str,
        name: &str,
        kind: ResourceKind,
        table: Option<&str>,
    ) -> AppResult<()> {
        let existed = self.adapter.unpublish(workspace, name, kind).await?;
        if !existed {
            debug!(workspace, name, "Layer was not published");
        }
        if kind == ResourceKind::Vectorial {
            match table {
                Some(table) => self.tables.drop_table(table).await?,
                None => debug!(workspace, name, "No backing table given, keeping data"),
            }
        }
        info!(workspace, name, %kind, "Layer deleted from catalog");
        Ok(())
    }
}

fn validate_target(request: &DuplicationRequest) -> AppResult<()> {
    if request.target_workspace.trim().is_empty() || request.new_name.trim().is_empty() {
        return Err(AppError::validation(
            "Duplication needs a target workspace and a new name",
        ));
    }
    Ok(())
}
