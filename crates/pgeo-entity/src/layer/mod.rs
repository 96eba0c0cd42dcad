//! Layer domain entities.

pub mod model;

pub use model::Layer;
