//! Catalog adapter contract.

use async_trait::async_trait;

use pgeo_core::result::AppResult;
use pgeo_entity::catalog::{BoundingBox, CatalogResourceDescriptor, GeometryType, ResourceKind};

/// Data needed to publish a table as a vector layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPublication {
    /// Target workspace.
    pub workspace: String,
    /// Datastore holding the table.
    pub datastore: String,
    /// Layer name.
    pub name: String,
    /// Layer title.
    pub title: String,
    /// Backing table.
    pub table: String,
    /// Native bounding box, when known.
    pub bbox: Option<BoundingBox>,
    /// Geometry type, used to pick the initial default style.
    pub geometry: Option<GeometryType>,
}

/// Data needed to publish a raster file as a coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPublication {
    /// Target workspace.
    pub workspace: String,
    /// Coverage store and coverage name.
    pub name: String,
    /// Coverage title.
    pub title: String,
    /// URL of the backing file, as the catalog sees it.
    pub file_url: String,
    /// Declared CRS.
    pub crs: String,
    /// Raster kind; decides the store format.
    pub kind: ResourceKind,
}

/// Operations on the remote map-publishing catalog.
///
/// Transport failures and timeouts are `CatalogUnreachable` errors; any
/// non-success answer is `CatalogRejected`. Lookups of absent resources
/// return `None` or `false` rather than an error.
#[async_trait]
pub trait CatalogAdapter: Send + Sync + std::fmt::Debug + 'static {
    /// Whether a workspace exists.
    async fn workspace_exists(&self, workspace: &str) -> AppResult<bool>;

    /// Create a workspace.
    async fn create_workspace(&self, workspace: &str) -> AppResult<()>;

    /// Whether a datastore exists in a workspace.
    async fn datastore_exists(&self, workspace: &str, datastore: &str) -> AppResult<bool>;

    /// Create a PostGIS datastore in a workspace.
    async fn create_datastore(&self, workspace: &str, datastore: &str) -> AppResult<()>;

    /// Describe a published feature type.
    async fn feature_type(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>>;

    /// Describe a coverage store; `source` carries the backing file URL.
    async fn coverage_store(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>>;

    /// Declared CRS of a coverage.
    async fn coverage_crs(&self, workspace: &str, name: &str) -> AppResult<Option<String>>;

    /// Publish a table as a vector layer.
    async fn publish_vector(&self, publication: &VectorPublication) -> AppResult<()>;

    /// Publish a raster file as a coverage.
    async fn publish_raster(&self, publication: &RasterPublication) -> AppResult<()>;

    /// Remove a published layer and its resource. Returns whether it existed.
    async fn unpublish(&self, workspace: &str, name: &str, kind: ResourceKind) -> AppResult<bool>;

    /// Whether a layer is published.
    async fn layer_exists(&self, workspace: &str, name: &str) -> AppResult<bool>;

    /// Qualified names (`workspace:name`) of every published layer.
    async fn list_layer_names(&self) -> AppResult<Vec<String>>;

    /// Names of every global style.
    async fn list_style_names(&self) -> AppResult<Vec<String>>;

    /// Create `new_style` as a copy of the default style of a layer.
    async fn copy_style(&self, workspace: &str, layer: &str, new_style: &str) -> AppResult<()>;

    /// Make `style` the default style of a layer.
    async fn set_style(&self, workspace: &str, layer: &str, style: &str) -> AppResult<()>;

    /// Delete a style. Returns whether it existed.
    async fn delete_style(&self, style: &str) -> AppResult<bool>;

    /// Check that the catalog answers.
    async fn health_check(&self) -> AppResult<bool>;
}
