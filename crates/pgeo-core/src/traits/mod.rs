//! Core traits defined in `pgeo-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
