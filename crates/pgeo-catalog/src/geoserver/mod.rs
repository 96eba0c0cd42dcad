//! GeoServer REST implementation of the catalog adapter.

pub mod client;
pub mod payload;
mod rest;

pub use client::GeoServerClient;
