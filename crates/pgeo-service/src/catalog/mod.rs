//! Synchronization of published layers with the remote catalog.

pub mod publication;
mod style;
pub mod sync;

pub use publication::PublicationService;
pub use sync::CatalogSyncEngine;
