//! Catalog resource kinds and descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pgeo_core::error::AppError;

/// The closed set of resource kinds the catalog can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Table-backed vector layer (PostGIS).
    Vectorial,
    /// Single GeoTIFF raster.
    GeoTiff,
    /// Image mosaic raster.
    ImageMosaic,
    /// World image (image + world file) raster.
    WorldImage,
    /// Remote WFS-sourced layer without local backing data.
    Remote,
}

impl ResourceKind {
    /// The layer type tag stored on layer records.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vectorial => "postgis",
            Self::GeoTiff => "geotiff",
            Self::ImageMosaic => "imagemosaic",
            Self::WorldImage => "imageworld",
            Self::Remote => "WFS",
        }
    }

    /// Whether the kind is one of the raster variants.
    pub fn is_raster(self) -> bool {
        matches!(self, Self::GeoTiff | Self::ImageMosaic | Self::WorldImage)
    }

    /// Coverage store format name used by the catalog's REST API.
    pub fn store_format(self) -> Option<&'static str> {
        match self {
            Self::GeoTiff => Some("geotiff"),
            Self::ImageMosaic => Some("imagemosaic"),
            Self::WorldImage => Some("worldimage"),
            Self::Vectorial | Self::Remote => None,
        }
    }

    /// Map a coverage store `type` reported by the catalog to a raster kind.
    pub fn from_store_type(store_type: &str) -> Option<Self> {
        match store_type.to_ascii_lowercase().as_str() {
            "geotiff" => Some(Self::GeoTiff),
            "imagemosaic" => Some(Self::ImageMosaic),
            "worldimage" => Some(Self::WorldImage),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgis" => Ok(Self::Vectorial),
            "geotiff" => Ok(Self::GeoTiff),
            "imagemosaic" => Ok(Self::ImageMosaic),
            "imageworld" | "worldimage" => Ok(Self::WorldImage),
            "wfs" => Ok(Self::Remote),
            _ => Err(AppError::validation(format!(
                "Unknown layer resource type '{tag}'"
            ))),
        }
    }
}

/// Geometry type of a vectorial resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryType {
    /// Points.
    Point,
    /// Multi-points.
    MultiPoint,
    /// Lines.
    Line,
    /// Multi-lines.
    MultiLine,
    /// Polygons.
    Polygon,
    /// Multi-polygons.
    MultiPolygon,
    /// Mixed or unknown geometry.
    Geometry,
}

impl GeometryType {
    /// Name of the catalog's built-in style for this geometry.
    pub fn default_style(self) -> &'static str {
        match self {
            Self::Point | Self::MultiPoint => "point",
            Self::Line | Self::MultiLine => "line",
            Self::Polygon | Self::MultiPolygon => "polygon",
            Self::Geometry => "generic",
        }
    }

    /// Canonical name, as stored on layer records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::Line => "LineString",
            Self::MultiLine => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::Geometry => "Geometry",
        }
    }
}

impl FromStr for GeometryType {
    type Err = AppError;

    /// Accepts plain names (`"MultiPolygon"`) and JTS bindings
    /// (`"org.locationtech.jts.geom.MultiPolygon"`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let simple = value.rsplit('.').next().unwrap_or(value);
        match simple.to_ascii_lowercase().as_str() {
            "point" => Ok(Self::Point),
            "multipoint" => Ok(Self::MultiPoint),
            "line" | "linestring" => Ok(Self::Line),
            "multiline" | "multilinestring" => Ok(Self::MultiLine),
            "polygon" => Ok(Self::Polygon),
            "multipolygon" => Ok(Self::MultiPolygon),
            "geometry" => Ok(Self::Geometry),
            _ => Err(AppError::validation(format!("Unknown geometry type '{value}'"))),
        }
    }
}

/// Native bounding box of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
    /// Coordinate reference system, e.g. `EPSG:25830`.
    pub crs: String,
}

/// Remote counterpart of a layer as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResourceDescriptor {
    /// Workspace holding the resource.
    pub workspace: String,
    /// Datastore or coverage store name.
    pub store: Option<String>,
    /// Layer / coverage name.
    pub name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Backing table (vectorial) or file URL (raster).
    pub source: Option<String>,
    /// Native bounding box.
    pub bbox: Option<BoundingBox>,
    /// Geometry type (vectorial only).
    pub geometry: Option<GeometryType>,
    /// Declared CRS.
    pub crs: Option<String>,
    /// Default style name.
    pub style: Option<String>,
}
