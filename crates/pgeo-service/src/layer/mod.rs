//! Layer bookkeeping.

pub mod service;

pub use service::LayerService;
