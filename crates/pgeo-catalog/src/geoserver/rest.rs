//! [`CatalogAdapter`] over the GeoServer REST API.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_entity::catalog::{CatalogResourceDescriptor, ResourceKind};

use super::client::{Body, GeoServerClient, encode};
use super::payload;
use crate::adapter::{CatalogAdapter, RasterPublication, VectorPublication};

const SLD_CONTENT_TYPE: &str = "application/vnd.ogc.sld+xml";

/// REST path of a style body, workspace-scoped when the name is qualified.
fn style_sld_path(style: &str) -> String {
    match style.split_once(':') {
        Some((workspace, name)) => format!(
            "/workspaces/{}/styles/{}.sld",
            encode(workspace),
            encode(name)
        ),
        None => format!("/styles/{}.sld", encode(style)),
    }
}

#[async_trait]
impl CatalogAdapter for GeoServerClient {
    async fn workspace_exists(&self, workspace: &str) -> AppResult<bool> {
        self.exists(&format!("/workspaces/{}.json", encode(workspace)))
            .await
    }

    async fn create_workspace(&self, workspace: &str) -> AppResult<()> {
        self.execute(
            Method::POST,
            "/workspaces",
            Body::Json(payload::workspace_body(workspace)),
        )
        .await?;
        info!(workspace, "Catalog workspace created");
        Ok(())
    }

    async fn datastore_exists(&self, workspace: &str, datastore: &str) -> AppResult<bool> {
        self.exists(&format!(
            "/workspaces/{}/datastores/{}.json",
            encode(workspace),
            encode(datastore)
        ))
        .await
    }

    async fn create_datastore(&self, workspace: &str, datastore: &str) -> AppResult<()> {
        self.execute(
            Method::POST,
            &format!("/workspaces/{}/datastores", encode(workspace)),
            Body::Json(payload::datastore_body(
                datastore,
                &self.config.jndi_reference,
            )),
        )
        .await?;
        info!(workspace, datastore, "Catalog datastore created");
        Ok(())
    }

    async fn feature_type(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>> {
        let doc: Option<Value> = self
            .get_json(&format!(
                "/workspaces/{}/featuretypes/{}.json",
                encode(workspace),
                encode(name)
            ))
            .await?;
        Ok(doc.and_then(|doc| payload::feature_type_descriptor(workspace, &doc)))
    }

    async fn coverage_store(
        &self,
        workspace: &str,
        name: &str,
    ) -> AppResult<Option<CatalogResourceDescriptor>> {
        let doc: Option<Value> = self
            .get_json(&format!(
                "/workspaces/{}/coveragestores/{}.json",
                encode(workspace),
                encode(name)
            ))
            .await?;
        Ok(doc.and_then(|doc| payload::coverage_store_descriptor(workspace, &doc)))
    }

    async fn coverage_crs(&self, workspace: &str, name: &str) -> AppResult<Option<String>> {
        let doc: Option<Value> = self
            .get_json(&format!(
                "/workspaces/{ws}/coveragestores/{name}/coverages/{name}.json",
                ws = encode(workspace),
                name = encode(name)
            ))
            .await?;
        Ok(doc.and_then(|doc| payload::coverage_crs(&doc)))
    }

    async fn publish_vector(&self, publication: &VectorPublication) -> AppResult<()> {
        let workspace = encode(&publication.workspace);
        self.execute(
            Method::POST,
            &format!(
                "/workspaces/{workspace}/datastores/{}/featuretypes",
                encode(&publication.datastore)
            ),
            Body::Json(payload::feature_type_body(publication)),
        )
        .await?;

        if let Some(geometry) = publication.geometry {
            self.set_style(
                &publication.workspace,
                &publication.name,
                geometry.default_style(),
            )
            .await?;
        }
        info!(
            workspace = %publication.workspace,
            name = %publication.name,
            table = %publication.table,
            "Vector layer published"
        );
        Ok(())
    }

    async fn publish_raster(&self, publication: &RasterPublication) -> AppResult<()> {
        let format = publication.kind.store_format().ok_or_else(|| {
            AppError::validation(format!(
                "Resource kind '{}' cannot be published as a coverage",
                publication.kind
            ))
        })?;
        let workspace = encode(&publication.workspace);
        let name = encode(&publication.name);

        self.execute(
            Method::PUT,
            &format!(
                "/workspaces/{workspace}/coveragestores/{name}/external.{format}\
                 ?configure=first&coverageName={name}"
            ),
            Body::Text("text/plain", publication.file_url.clone()),
        )
        .await?;
        self.execute(
            Method::PUT,
            &format!("/workspaces/{workspace}/coveragestores/{name}/coverages/{name}"),
            Body::Json(payload::coverage_body(&publication.title, &publication.crs)),
        )
        .await?;
        info!(
            workspace = %publication.workspace,
            name = %publication.name,
            kind = %publication.kind,
            "Raster layer published"
        );
        Ok(())
    }

    async fn unpublish(&self, workspace: &str, name: &str, kind: ResourceKind) -> AppResult<bool> {
        let path = if kind.is_raster() {
            format!(
                "/workspaces/{}/coveragestores/{}?recurse=true",
                encode(workspace),
                encode(name)
            )
        } else {
            format!(
                "/workspaces/{}/layers/{}?recurse=true",
                encode(workspace),
                encode(name)
            )
        };
        let existed = self.delete(&path).await?;
        info!(workspace, name, existed, "Layer unpublished");
        Ok(existed)
    }

    async fn layer_exists(&self, workspace: &str, name: &str) -> AppResult<bool> {
        self.exists(&format!("/layers/{}:{}.json", encode(workspace), encode(name)))
            .await
    }

    async fn list_layer_names(&self) -> AppResult<Vec<String>> {
        let doc: Option<Value> = self.get_json("/layers.json").await?;
        Ok(doc.map(|doc| payload::layer_names(&doc)).unwrap_or_default())
    }

    async fn list_style_names(&self) -> AppResult<Vec<String>> {
        let doc: Option<Value> = self.get_json("/styles.json").await?;
        Ok(doc.map(|doc| payload::style_names(&doc)).unwrap_or_default())
    }

    async fn copy_style(&self, workspace: &str, layer: &str, new_style: &str) -> AppResult<()> {
        let layer_path = format!("/layers/{}:{}.json", encode(workspace), encode(layer));
        let layer_doc: Option<Value> = self.get_json(&layer_path).await?;
        let source_style = layer_doc
            .as_ref()
            .and_then(payload::default_style)
            .ok_or_else(|| {
                AppError::not_found(format!("Layer '{workspace}:{layer}' has no default style"))
            })?;

        let sld = self
            .get_text(&style_sld_path(&source_style))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Style '{source_style}' not found")))?;

        self.execute(
            Method::POST,
            &format!("/styles?name={}", encode(new_style)),
            Body::Text(SLD_CONTENT_TYPE, sld),
        )
        .await?;
        info!(source = %source_style, target = new_style, "Style copied");
        Ok(())
    }

    async fn set_style(&self, workspace: &str, layer: &str, style: &str) -> AppResult<()> {
        self.execute(
            Method::PUT,
            &format!("/layers/{}:{}", encode(workspace), encode(layer)),
            Body::Json(payload::layer_style_body(style)),
        )
        .await?;
        Ok(())
    }

    async fn delete_style(&self, style: &str) -> AppResult<bool> {
        self.delete(&format!("/styles/{}?purge=true", encode(style)))
            .await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.exists("/about/version.json").await
    }
}
