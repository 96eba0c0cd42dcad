//! # pgeo-entity
//!
//! Domain records for persistence-geo. Every struct that maps to a
//! database table derives `sqlx::FromRow`; views and catalog types are
//! plain serde value objects.

pub mod catalog;
pub mod folder;
pub mod layer;
pub mod owner;

pub use owner::Owner;
