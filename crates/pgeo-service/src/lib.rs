//! # pgeo-service
//!
//! Business logic for persistence-geo: the folder tree mutation engine,
//! layer bookkeeping and synchronization with the remote catalog.
//!
//! Services follow constructor injection; every dependency is handed in
//! at construction time behind an `Arc` or a cheap clone.

pub mod catalog;
pub mod folder;
pub mod layer;

pub use catalog::{CatalogSyncEngine, PublicationService};
pub use folder::{FolderQuery, FolderService};
pub use layer::LayerService;
