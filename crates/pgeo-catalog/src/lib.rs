//! # pgeo-catalog
//!
//! Everything persistence-geo says to the outside world about published
//! layers: the [`CatalogAdapter`] seam with a GeoServer REST
//! implementation, the [`SpatialTableStore`] seam with a PostGIS
//! implementation, and in-memory doubles of both.

pub mod adapter;
pub mod geoserver;
pub mod memory;
pub mod tables;

pub use adapter::{CatalogAdapter, RasterPublication, VectorPublication};
pub use geoserver::GeoServerClient;
pub use memory::{CatalogOp, InMemoryCatalog, MemoryTableStore};
pub use tables::{PostgisTableStore, SpatialTableStore};
