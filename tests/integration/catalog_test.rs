//! Integration tests for catalog synchronization and layer publication.

mod helpers;

use uuid::Uuid;

use helpers::TestApp;
use pgeo_catalog::{CatalogAdapter, CatalogOp};
use pgeo_core::error::ErrorKind;
use pgeo_entity::catalog::{
    BoundingBox, CatalogResourceDescriptor, DuplicationResult, GeometryType, ResourceKind,
};
use pgeo_entity::layer::Layer;

fn roads() -> CatalogResourceDescriptor {
    CatalogResourceDescriptor {
        workspace: "ws1".to_string(),
        store: Some("ws1_datastore".to_string()),
        name: "roads".to_string(),
        kind: ResourceKind::Vectorial,
        source: Some("roads_tbl".to_string()),
        bbox: Some(BoundingBox {
            min_x: -3.8,
            min_y: 40.3,
            max_x: -3.5,
            max_y: 40.6,
            crs: "EPSG:4258".to_string(),
        }),
        geometry: Some(GeometryType::MultiLine),
        crs: Some("EPSG:4258".to_string()),
        style: None,
    }
}

fn dem() -> CatalogResourceDescriptor {
    CatalogResourceDescriptor {
        workspace: "ws1".to_string(),
        store: Some("dem".to_string()),
        name: "dem".to_string(),
        kind: ResourceKind::GeoTiff,
        source: Some("file:data/dem.tif".to_string()),
        bbox: None,
        geometry: None,
        crs: None,
        style: None,
    }
}

async fn with_roads() -> TestApp {
    let app = TestApp::new().await;
    app.catalog.add_vector_layer(roads(), "roads_style").await;
    app.tables.add_table("roads_tbl").await;
    app
}

/// Save a layer already published in `ws1` under the name `roads`.
async fn published_layer(app: &TestApp, layer_type: &str) -> Layer {
    let owner = app.user().await;
    let folder = app.root(owner, "published").await;
    let mut layer = Layer::new("roads", helpers::id_of(&folder), owner);
    layer.layer_type = Some(layer_type.to_string());
    layer.workspace = Some("ws1".to_string());
    layer.server_resource = Some("roads".to_string());
    layer.table_name = Some("roads_tbl".to_string());
    layer.style_name = Some("roads_style".to_string());
    layer.published = true;
    app.platform.layers.save_layer(&layer).await.unwrap()
}

#[tokio::test]
async fn test_vectorial_duplication_copies_data_and_style() {
    let app = with_roads().await;

    let result = app
        .platform
        .sync
        .duplicate_by_tag("ws1", "postgis", "roads", None, "ws2", "roads_copy", "Roads copy")
        .await;

    assert_eq!(result, DuplicationResult::SuccessVectorial);
    assert!(app.tables.contains("roads_copy").await);
    assert!(app.catalog.has_datastore("ws2", "ws2_datastore").await);
    assert!(app.catalog.has_style("roads_copy").await);
    assert_eq!(
        app.catalog.layer_style("ws2", "roads_copy").await.as_deref(),
        Some("roads_copy")
    );

    let copied = app
        .catalog
        .feature_type("ws2", "roads_copy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied.source.as_deref(), Some("roads_copy"));
    assert_eq!(copied.bbox, roads().bbox);
    assert_eq!(copied.geometry, Some(GeometryType::MultiLine));
}

#[tokio::test]
async fn test_failed_publish_leaves_no_target_layer_or_style() {
    let app = with_roads().await;
    app.catalog.fail_on(CatalogOp::PublishVector).await;

    let result = app
        .platform
        .sync
        .duplicate_by_tag("ws1", "postgis", "roads", None, "ws2", "roads_copy", "Roads copy")
        .await;

    assert_eq!(result, DuplicationResult::Failure);
    assert!(!app.catalog.has_style("roads_copy").await);
    assert!(!app.catalog.layer_exists("ws2", "roads_copy").await.unwrap());
    let calls = app.catalog.calls().await;
    assert!(!calls.contains(&CatalogOp::CopyStyle));
    assert!(!calls.contains(&CatalogOp::SetStyle));
}

#[tokio::test]
async fn test_raster_duplication_falls_back_to_default_crs() {
    let app = TestApp::new().await;
    app.catalog.add_raster_layer(dem(), "dem_style").await;

    let result = app
        .platform
        .sync
        .duplicate_by_tag("ws1", "GeoTIFF", "dem", None, "rasters", "dem_copy", "DEM copy")
        .await;

    assert_eq!(result, DuplicationResult::SuccessRaster);
    let crs = app.catalog.coverage_crs("rasters", "dem_copy").await.unwrap();
    assert_eq!(crs.as_deref(), Some("EPSG:4326"));
    assert_eq!(
        app.catalog.layer_style("rasters", "dem_copy").await.as_deref(),
        Some("dem_copy")
    );
    assert!(!app.tables.calls().await.contains(&CatalogOp::CopyTable));
}

#[tokio::test]
async fn test_missing_raster_source_fails() {
    let app = TestApp::new().await;

    let result = app
        .platform
        .sync
        .duplicate_by_tag("ws1", "imagemosaic", "nothing", None, "ws2", "copy", "Copy")
        .await;

    assert_eq!(result, DuplicationResult::Failure);
    assert!(!app.catalog.workspace_exists("ws2").await.unwrap());
}

#[tokio::test]
async fn test_clean_unused_styles_removes_only_existing() {
    let app = TestApp::new().await;
    app.catalog.add_style("b").await;

    let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let removed = app.platform.sync.clean_unused_styles(&names).await.unwrap();

    assert_eq!(removed, vec!["b".to_string()]);
    assert!(!app.catalog.has_style("b").await);
    assert!(app.catalog.has_style("point").await);
}

#[tokio::test]
async fn test_clean_unused_styles_propagates_listing_failure() {
    let app = TestApp::new().await;
    app.catalog.fail_on(CatalogOp::ListStyles).await;

    let err = app
        .platform
        .sync
        .clean_unused_styles(&["b".to_string()])
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::CatalogRejected));
}

#[tokio::test]
async fn test_delete_by_tag_drops_table() {
    let app = with_roads().await;

    assert!(
        app.platform
            .sync
            .delete_by_tag("ws1", "roads", "POSTGIS", Some("roads_tbl"))
            .await
    );
    assert!(!app.catalog.layer_exists("ws1", "roads").await.unwrap());
    assert!(!app.tables.contains("roads_tbl").await);

    assert!(!app.platform.sync.delete_by_tag("ws1", "roads", "shapefile", None).await);
}

#[tokio::test]
async fn test_publication_is_recorded_on_success() {
    let app = with_roads().await;
    let layer = published_layer(&app, "postgis").await;

    let result = app
        .platform
        .publications
        .duplicate_layer_publication(layer.id, "ws2", "roads_copy", "Roads copy")
        .await
        .unwrap();
    assert_eq!(result, DuplicationResult::SuccessVectorial);

    let recorded = app.platform.layers.get_layer(layer.id).await.unwrap();
    assert_eq!(recorded.workspace.as_deref(), Some("ws2"));
    assert_eq!(recorded.server_resource.as_deref(), Some("roads_copy"));
    assert_eq!(recorded.table_name.as_deref(), Some("roads_copy"));
    assert_eq!(recorded.style_name.as_deref(), Some("roads_copy"));
    assert_eq!(recorded.title.as_deref(), Some("Roads copy"));
    assert!(recorded.published);
    assert_eq!(recorded.created_at, layer.created_at);
}

#[tokio::test]
async fn test_failed_publication_leaves_layer_untouched() {
    let app = with_roads().await;
    let layer = published_layer(&app, "postgis").await;
    app.catalog.fail_on(CatalogOp::PublishVector).await;

    let result = app
        .platform
        .publications
        .duplicate_layer_publication(layer.id, "ws2", "roads_copy", "Roads copy")
        .await
        .unwrap();
    assert_eq!(result, DuplicationResult::Failure);

    let stored = app.platform.layers.get_layer(layer.id).await.unwrap();
    assert_eq!(stored.workspace.as_deref(), Some("ws1"));
    assert_eq!(stored.server_resource.as_deref(), Some("roads"));
    assert_eq!(stored.updated_at, layer.updated_at);
}

#[tokio::test]
async fn test_unpublished_layer_cannot_be_duplicated() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let folder = app.root(owner, "drafts").await;
    let draft = app.layer(owner, &folder, "draft", "postgis").await;

    let result = app
        .platform
        .publications
        .duplicate_layer_publication(draft.id, "ws2", "copy", "Copy")
        .await
        .unwrap();
    assert_eq!(result, DuplicationResult::Failure);
    assert!(app.catalog.calls().await.is_empty());

    let err = app
        .platform
        .publications
        .unpublish_layer(draft.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    let err = app
        .platform
        .publications
        .duplicate_layer_publication(Uuid::new_v4(), "ws2", "copy", "Copy")
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_remote_publication_touches_no_catalog() {
    let app = TestApp::new().await;
    let layer = published_layer(&app, "WFS").await;

    let result = app
        .platform
        .publications
        .duplicate_layer_publication(layer.id, "ws2", "remote_copy", "Remote copy")
        .await
        .unwrap();
    assert_eq!(result, DuplicationResult::SuccessRemote);
    assert!(app.catalog.calls().await.is_empty());

    let recorded = app.platform.layers.get_layer(layer.id).await.unwrap();
    assert_eq!(recorded.workspace.as_deref(), Some("ws2"));
    assert_eq!(recorded.server_resource.as_deref(), Some("remote_copy"));
    assert_eq!(recorded.table_name.as_deref(), Some("roads_tbl"));
    assert_eq!(recorded.style_name.as_deref(), Some("roads_style"));

    assert!(app.platform.publications.unpublish_layer(layer.id).await.unwrap());
    assert!(app.catalog.calls().await.is_empty());
    assert!(!app.platform.layers.get_layer(layer.id).await.unwrap().published);
}

#[tokio::test]
async fn test_unpublish_removes_layer_and_table() {
    let app = with_roads().await;
    let layer = published_layer(&app, "postgis").await;

    assert!(app.platform.publications.unpublish_layer(layer.id).await.unwrap());

    assert!(!app.catalog.layer_exists("ws1", "roads").await.unwrap());
    assert!(!app.tables.contains("roads_tbl").await);
    let stored = app.platform.layers.get_layer(layer.id).await.unwrap();
    assert!(!stored.published);
    assert_eq!(stored.workspace.as_deref(), Some("ws1"));
}

#[tokio::test]
async fn test_rejected_unpublish_keeps_record() {
    let app = with_roads().await;
    let layer = published_layer(&app, "postgis").await;
    app.catalog.fail_on(CatalogOp::Unpublish).await;

    assert!(!app.platform.publications.unpublish_layer(layer.id).await.unwrap());
    assert!(app.platform.layers.get_layer(layer.id).await.unwrap().published);
    assert!(app.tables.contains("roads_tbl").await);
}

#[tokio::test]
async fn test_copied_layer_does_not_own_source_resource() {
    let app = with_roads().await;
    let source = published_layer(&app, "postgis").await;
    let origin = source.owner().unwrap();
    let target = app.user().await;

    app.platform
        .folders
        .copy_user_context(origin, target, false)
        .await
        .unwrap();
    let clone = app.layers_of(target).await.remove(0);
    assert!(!clone.published);
    assert_eq!(clone.workspace.as_deref(), Some("ws1"));
    assert_eq!(clone.table_name.as_deref(), Some("roads_tbl"));

    let err = app
        .platform
        .publications
        .unpublish_layer(clone.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
    assert!(app.catalog.calls().await.is_empty());
    assert!(app.catalog.layer_exists("ws1", "roads").await.unwrap());
    assert!(app.tables.contains("roads_tbl").await);
    assert!(app.platform.layers.get_layer(source.id).await.unwrap().published);
}
