//! Folder tree engine.

mod copy;
mod delete;
pub mod query;
pub mod service;
pub mod tree;
mod types;
pub(crate) mod unit;

pub use query::FolderQuery;
pub use service::FolderService;
