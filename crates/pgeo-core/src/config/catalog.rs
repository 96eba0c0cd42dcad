//! Remote catalog (GeoServer) configuration.

use serde::{Deserialize, Serialize};

/// Connection and publication settings for the remote catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the GeoServer instance, e.g. `http://localhost:8080/geoserver`.
    pub url: String,
    /// REST API user.
    #[serde(default = "default_username")]
    pub username: String,
    /// REST API password.
    #[serde(default)]
    pub password: String,
    /// Per-request timeout in seconds. A timeout is reported as an
    /// unreachable catalog, never as a panic.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// JNDI resource used when creating PostGIS datastores.
    #[serde(default = "default_jndi")]
    pub jndi_reference: String,
    /// Suffix appended to a workspace name to derive its datastore name.
    #[serde(default = "default_datastore_suffix")]
    pub datastore_suffix: String,
    /// CRS used when a raster source does not declare one.
    #[serde(default = "default_crs")]
    pub default_crs: String,
}

impl CatalogConfig {
    /// Datastore name used for vectorial layers of a workspace.
    pub fn datastore_for(&self, workspace: &str) -> String {
        format!("{workspace}{}", self.datastore_suffix)
    }
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_jndi() -> String {
    "java:comp/env/jdbc/geodata".to_string()
}

fn default_datastore_suffix() -> String {
    "_datastore".to_string()
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}
