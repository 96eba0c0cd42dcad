//! Requests and outcomes of catalog layer duplication.

use serde::{Deserialize, Serialize};

use pgeo_core::result::AppResult;

use super::resource::ResourceKind;

/// Outcome of a duplication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicationResult {
    /// A vectorial layer was copied and published.
    SuccessVectorial,
    /// A raster layer was republished.
    SuccessRaster,
    /// A remote layer needs no catalog work.
    SuccessRemote,
    /// A step failed; later steps were skipped.
    Failure,
}

impl DuplicationResult {
    /// Whether the request succeeded.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Failure)
    }
}

/// What is being duplicated, with exactly the data each procedure needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicationSource {
    /// Table-backed layer; the table is looked up in the catalog when absent.
    Vectorial {
        /// Backing table of the source layer.
        table: Option<String>,
    },
    /// GeoTIFF coverage.
    GeoTiff,
    /// Image mosaic coverage.
    ImageMosaic,
    /// World image coverage.
    WorldImage,
    /// Remote (WFS) layer.
    Remote,
}

impl DuplicationSource {
    /// Build a source from a layer type tag.
    pub fn from_tag(tag: &str, table: Option<String>) -> AppResult<Self> {
        Ok(match tag.parse::<ResourceKind>()? {
            ResourceKind::Vectorial => Self::Vectorial { table },
            ResourceKind::GeoTiff => Self::GeoTiff,
            ResourceKind::ImageMosaic => Self::ImageMosaic,
            ResourceKind::WorldImage => Self::WorldImage,
            ResourceKind::Remote => Self::Remote,
        })
    }

    /// The resource kind of this source.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Vectorial { .. } => ResourceKind::Vectorial,
            Self::GeoTiff => ResourceKind::GeoTiff,
            Self::ImageMosaic => ResourceKind::ImageMosaic,
            Self::WorldImage => ResourceKind::WorldImage,
            Self::Remote => ResourceKind::Remote,
        }
    }
}

/// A request to duplicate a published layer under a new workspace/name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationRequest {
    /// Workspace of the source layer.
    pub source_workspace: String,
    /// Catalog name of the source layer.
    pub source_name: String,
    /// Kind-specific source data.
    pub source: DuplicationSource,
    /// Workspace the copy is published in.
    pub target_workspace: String,
    /// Catalog name of the copy.
    pub new_name: String,
    /// Title of the copy.
    pub new_title: String,
}

impl DuplicationRequest {
    /// Build a request from a layer type tag. Unknown tags are rejected.
    pub fn from_tag(
        source_workspace: impl Into<String>,
        source_type: &str,
        source_name: impl Into<String>,
        source_table: Option<String>,
        target_workspace: impl Into<String>,
        new_name: impl Into<String>,
        new_title: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            source_workspace: source_workspace.into(),
            source_name: source_name.into(),
            source: DuplicationSource::from_tag(source_type, source_table)?,
            target_workspace: target_workspace.into(),
            new_name: new_name.into(),
            new_title: new_title.into(),
        })
    }
}
