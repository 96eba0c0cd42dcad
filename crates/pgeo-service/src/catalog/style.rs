//! Style operations.

use tracing::{info, warn};

use pgeo_core::result::AppResult;

use super::sync::CatalogSyncEngine;

impl CatalogSyncEngine {
    /// Copies the default style of a layer as `new_style`.
    pub async fn copy_layer_style(&self, workspace: &str, layer: &str, new_style: &str) -> bool {
        match self.adapter.copy_style(workspace, layer, new_style).await {
            Ok(()) => true,
            Err(e) => {
                warn!(workspace, layer, new_style, error = %e, "Failed to copy style");
                false
            }
        }
    }

    /// Makes an existing style the default style of a layer.
    pub async fn set_layer_style(&self, workspace: &str, layer: &str, style: &str) -> bool {
        match self.adapter.set_style(workspace, layer, style).await {
            Ok(()) => true,
            Err(e) => {
                warn!(workspace, layer, style, error = %e, "Failed to set style");
                false
            }
        }
    }

    /// Deletes a style. Returns `false` when it did not exist or the
    /// catalog refused.
    pub async fn delete_style(&self, style: &str) -> bool {
        match self.adapter.delete_style(style).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(style, error = %e, "Failed to delete style");
                false
            }
        }
    }

    /// Names of every style in the catalog.
    pub async fn style_names(&self) -> AppResult<Vec<String>> {
        self.adapter.list_style_names().await
    }

    /// Deletes those of `names` that exist in the catalog and returns
    /// them, in input order. A style that fails to delete is skipped.
    pub async fn clean_unused_styles(&self, names: &[String]) -> AppResult<Vec<String>> {
        let existing = self.adapter.list_style_names().await?;

        let mut removed = Vec::new();
        for name in names.iter().filter(|name| existing.contains(*name)) {
            match self.adapter.delete_style(name).await {
                Ok(true) => removed.push(name.clone()),
                Ok(false) => {}
                Err(e) => warn!(style = %name, error = %e, "Failed to delete unused style"),
            }
        }
        info!(requested = names.len(), removed = removed.len(), "Unused styles cleaned");
        Ok(removed)
    }
}
