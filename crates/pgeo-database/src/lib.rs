//! # pgeo-database
//!
//! The tree store contract used by the folder engine, with a PostgreSQL
//! implementation built on sqlx and an in-memory implementation for
//! single-process deployments and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryTreeStore;
pub use postgres::PgTreeStore;
pub use store::{FolderFilter, ParentFilter, ReferenceKind, TreeStore, TreeTransaction, ZoneFilter};
