//! Types describing resources held by the remote catalog.

pub mod duplication;
pub mod resource;

pub use duplication::{DuplicationRequest, DuplicationResult, DuplicationSource};
pub use resource::{BoundingBox, CatalogResourceDescriptor, GeometryType, ResourceKind};
