//! In-memory catalog and table store.
//!
//! Both record every call they receive and can be told to fail a given
//! operation, which makes the synchronization sequences observable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_entity::catalog::{CatalogResourceDescriptor, ResourceKind};

use crate::adapter::{CatalogAdapter, RasterPublication, VectorPublication};
use crate::tables::SpatialTableStore;

/// Built-in styles every catalog starts with.
const BUILTIN_STYLES: [&str; 5] = ["point", "line", "polygon", "generic", "raster"];

/// Operations of the catalog and table seams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    /// [`CatalogAdapter::workspace_exists`]
    WorkspaceExists,
    /// [`CatalogAdapter::create_workspace`]
    CreateWorkspace,
    /// [`CatalogAdapter::datastore_exists`]
    DatastoreExists,
    /// [`CatalogAdapter::create_datastore`]
    CreateDatastore,
    /// [`CatalogAdapter::feature_type`]
    FeatureType,
    /// [`CatalogAdapter::coverage_store`]
    CoverageStore,
    /// [`CatalogAdapter::coverage_crs`]
    CoverageCrs,
    /// [`CatalogAdapter::publish_vector`]
    PublishVector,
    /// [`CatalogAdapter::publish_raster`]
    PublishRaster,
    /// [`CatalogAdapter::unpublish`]
    Unpublish,
    /// [`CatalogAdapter::layer_exists`]
    LayerExists,
    /// [`CatalogAdapter::list_layer_names`]
    ListLayers,
    /// [`CatalogAdapter::list_style_names`]
    ListStyles,
    /// [`CatalogAdapter::copy_style`]
    CopyStyle,
    /// [`CatalogAdapter::set_style`]
    SetStyle,
    /// [`CatalogAdapter::delete_style`]
    DeleteStyle,
    /// [`CatalogAdapter::health_check`]
    HealthCheck,
    /// [`SpatialTableStore::copy_table`]
    CopyTable,
    /// [`SpatialTableStore::drop_table`]
    DropTable,
    /// [`SpatialTableStore::table_exists`]
    TableExists,
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Vec<CatalogOp>,
    failures: HashSet<CatalogOp>,
}

impl CallLog {
    fn enter(&mut self, op: CatalogOp) -> AppResult<()> {
        self.calls.push(op);
        if self.failures.contains(&op) {
            return Err(AppError::catalog_rejected(format!("Injected failure on {op:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PublishedLayer {
    kind: ResourceKind,
    style: Option<String>,
}

#[derive(Debug, Default)]
struct CatalogState {
    log: CallLog,
    workspaces: HashSet<String>,
    datastores: HashSet<(String, String)>,
    feature_types: HashMap<(String, String), CatalogResourceDescriptor>,
    coverage_stores: HashMap<(String, String), CatalogResourceDescriptor>,
    layers: HashMap<(String, String), PublishedLayer>,
    styles: HashSet<String>,
}

fn key(workspace: &str, name: &str) -> (String, String) {
    (workspace.to_string(), name.to_string())
}

/// A catalog held in process memory.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    /// Create a catalog holding only the built-in styles.
    pub fn new() -> Self {
        let state = CatalogState {
            styles: BUILTIN_STYLES.iter().map(|s| s.to_string()).collect(),
            ..CatalogState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make every later call of `op` fail.
    pub async fn fail_on(&self, op: CatalogOp) {
        self.state.lock().await.log.failures.insert(op);
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<CatalogOp> {
        self.state.lock().await.log.calls.clone()
    }

    /// Register a style.
    pub async fn add_style(&self, style: &str) {
        self.state.lock().await.styles.insert(style.to_string());
    }

    /// Whether a style exists.
    pub async fn has_style(&self, style: &str) -> bool {
        self.state.lock().await.styles.contains(style)
    }

    /// Register a published vector layer with its workspace and datastore.
    pub async fn add_vector_layer(&self, descriptor: CatalogResourceDescriptor, style: &str) {
        let mut state = self.state.lock().await;
        let ws = descriptor.workspace.clone();
        state.workspaces.insert(ws.clone());
        if let Some(store) = &descriptor.store {
            state.datastores.insert(key(&ws, store));
        }
        state.styles.insert(style.to_string());
        state.layers.insert(
            key(&ws, &descriptor.name),
            PublishedLayer {
                kind: ResourceKind::Vectorial,
                style: Some(style.to_string()),
            },
        );
        state
            .feature_types
            .insert(key(&ws, &descriptor.name), descriptor);
    }

    /// Register a published raster layer.
    pub async fn add_raster_layer(&self, descriptor: CatalogResourceDescriptor, style: &str) {
        let mut state = self.state.lock().await;
        let ws = descriptor.workspace.clone();
        state.workspaces.insert(ws.clone());
        state.styles.insert(style.to_string());
        state.layers.insert(
            key(&ws, &descriptor.name),
            PublishedLayer {
                kind: descriptor.kind,
                style: Some(style.to_string()),
            },
        );
        state
            .coverage_stores
            .insert(key(&ws, &descriptor.name), descriptor);
    }

    /// Default style of a published layer.
    pub async fn layer_style(&self, workspace: &str, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .layers
            .get(&key(workspace, name))
            .and_then(|layer| layer.style.clone())
    }

    /// Whether a datastore exists.
    pub async fn has_datastore(&self, workspace: &str, datastore: &str) -> bool {
        self.state
            .lock()
            .await
            .datastores
            .contains(&key(workspace, datastore))
    }
}

#[async_trait]
impl CatalogAdapter for InMemoryCatalog {
    async fn workspace_exists(&self, workspace: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::WorkspaceExists)?;
        Ok(state.workspaces.contains(workspace))
    }

    async fn create_workspace(&self, workspace: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CreateWorkspace)?;
        if !state.workspaces.insert(workspace.to_string()) {
            return Err(AppError::catalog_rejected(format!(
                "Workspace '{workspace}' already exists"
            )));
        }
        Ok(())
    }

    async fn datastore_exists(&self, workspace: &str, datastore: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::DatastoreExists)?;
        Ok(state.datastores.contains(&key(workspace, datastore)))
    }

    async fn create_datastore(&self, workspace: &str, datastore: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CreateDatastore)?;
        if !state.workspaces.contains(workspace) {
            return Err(AppError::catalog_rejected(format!(
                "Workspace '{workspace}' does not exist"
            )));
        }
        state.datastores.insert(key(workspace, datastore));
        Ok(())
    }

    async fn feature_type(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::FeatureType)?;
        Ok(state.feature_types.get(&key(workspace, name)).cloned())
    }

    async fn coverage_store(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CoverageStore)?;
        Ok(state.coverage_stores.get(&key(workspace, name)).cloned())
    }

    async fn coverage_crs(&self, workspace: &str, name: &str) -> AppResult<Option<String>> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CoverageCrs)?;
        Ok(state
            .coverage_stores
            .get(&key(workspace, name))
            .and_then(|d| d.crs.clone()))
    }

    async fn publish_vector(&self, publication: &VectorPublication) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::PublishVector)?;
        let ws = &publication.workspace;
        if !state.datastores.contains(&key(ws, &publication.datastore)) {
            return Err(AppError::catalog_rejected(format!(
                "Datastore '{}' does not exist in '{ws}'",
                publication.datastore
            )));
        }
        if state.layers.contains_key(&key(ws, &publication.name)) {
            return Err(AppError::catalog_rejected(format!(
                "Layer '{ws}:{}' already exists",
                publication.name
            )));
        }
        let descriptor = CatalogResourceDescriptor {
            workspace: ws.clone(),
            store: Some(publication.datastore.clone()),
            name: publication.name.clone(),
            kind: ResourceKind::Vectorial,
            source: Some(publication.table.clone()),
            bbox: publication.bbox.clone(),
            geometry: publication.geometry,
            crs: publication.bbox.as_ref().map(|b| b.crs.clone()),
            style: None,
        };
        state.feature_types.insert(key(ws, &publication.name), descriptor);
        state.layers.insert(
            key(ws, &publication.name),
            PublishedLayer {
                kind: ResourceKind::Vectorial,
                style: publication.geometry.map(|g| g.default_style().to_string()),
            },
        );
        Ok(())
    }

    async fn publish_raster(&self, publication: &RasterPublication) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::PublishRaster)?;
        let ws = &publication.workspace;
        if !state.workspaces.contains(ws) {
            return Err(AppError::catalog_rejected(format!(
                "Workspace '{ws}' does not exist"
            )));
        }
        let descriptor = CatalogResourceDescriptor {
            workspace: ws.clone(),
            store: Some(publication.name.clone()),
            name: publication.name.clone(),
            kind: publication.kind,
            source: Some(publication.file_url.clone()),
            bbox: None,
            geometry: None,
            crs: Some(publication.crs.clone()),
            style: None,
        };
        state
            .coverage_stores
            .insert(key(ws, &publication.name), descriptor);
        state.layers.insert(
            key(ws, &publication.name),
            PublishedLayer {
                kind: publication.kind,
                style: Some("raster".to_string()),
            },
        );
        Ok(())
    }

    async fn unpublish(&self, workspace: &str, name: &str, kind: ResourceKind) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::Unpublish)?;
        let k = key(workspace, name);
        let existed = state.layers.remove(&k).is_some();
        if kind.is_raster() {
            state.coverage_stores.remove(&k);
        } else {
            state.feature_types.remove(&k);
        }
        Ok(existed)
    }

    async fn layer_exists(&self, workspace: &str, name: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::LayerExists)?;
        Ok(state.layers.contains_key(&key(workspace, name)))
    }

    async fn list_layer_names(&self) -> AppResult<Vec<String>> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::ListLayers)?;
        let mut names: Vec<String> = state
            .layers
            .keys()
            .map(|(ws, name)| format!("{ws}:{name}"))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_style_names(&self) -> AppResult<Vec<String>> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::ListStyles)?;
        let mut names: Vec<String> = state.styles.iter().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn copy_style(&self, workspace: &str, layer: &str, new_style: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CopyStyle)?;
        let source = state
            .layers
            .get(&key(workspace, layer))
            .and_then(|l| l.style.clone())
            .ok_or_else(|| {
                AppError::not_found(format!("Layer '{workspace}:{layer}' has no default style"))
            })?;
        if !state.styles.contains(&source) {
            return Err(AppError::not_found(format!("Style '{source}' not found")));
        }
        if !state.styles.insert(new_style.to_string()) {
            return Err(AppError::catalog_rejected(format!(
                "Style '{new_style}' already exists"
            )));
        }
        Ok(())
    }

    async fn set_style(&self, workspace: &str, layer: &str, style: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::SetStyle)?;
        if !state.styles.contains(style) {
            return Err(AppError::catalog_rejected(format!("Style '{style}' not found")));
        }
        let entry = state.layers.get_mut(&key(workspace, layer)).ok_or_else(|| {
            AppError::catalog_rejected(format!("Layer '{workspace}:{layer}' not found"))
        })?;
        entry.style = Some(style.to_string());
        Ok(())
    }

    async fn delete_style(&self, style: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::DeleteStyle)?;
        Ok(state.styles.remove(style))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::HealthCheck)?;
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct TableState {
    log: CallLog,
    tables: HashSet<String>,
}

/// A table store held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    state: Arc<Mutex<TableState>>,
}

impl MemoryTableStore {
    /// Create a store holding `tables`.
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = TableState {
            log: CallLog::default(),
            tables: tables.into_iter().map(Into::into).collect(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make every later call of `op` fail.
    pub async fn fail_on(&self, op: CatalogOp) {
        self.state.lock().await.log.failures.insert(op);
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<CatalogOp> {
        self.state.lock().await.log.calls.clone()
    }

    /// Register a table.
    pub async fn add_table(&self, table: &str) {
        self.state.lock().await.tables.insert(table.to_string());
    }

    /// Whether a table exists, without recording a call.
    pub async fn contains(&self, table: &str) -> bool {
        self.state.lock().await.tables.contains(table)
    }
}

#[async_trait]
impl SpatialTableStore for MemoryTableStore {
    async fn copy_table(&self, source: &str, target: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::CopyTable)?;
        if !state.tables.contains(source) {
            return Err(AppError::database(format!("Table '{source}' does not exist")));
        }
        if !state.tables.insert(target.to_string()) {
            return Err(AppError::database(format!("Table '{target}' already exists")));
        }
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::DropTable)?;
        state.tables.remove(table);
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.log.enter(CatalogOp::TableExists)?;
        Ok(state.tables.contains(table))
    }
}
