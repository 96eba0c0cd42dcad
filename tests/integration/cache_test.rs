//! Integration tests for root folder caching and invalidation.

mod helpers;

use std::sync::Arc;

use chrono::Utc;

use helpers::{OutageCache, TestApp, id_of};
use pgeo_entity::folder::FolderView;

async fn cached_names(app: &TestApp, owner: pgeo_entity::owner::Owner) -> Option<Vec<String>> {
    app.platform
        .root_cache
        .get(owner)
        .await
        .unwrap()
        .map(|root| root.children.iter().map(|c| c.name.clone()).collect())
}

#[tokio::test]
async fn test_root_is_served_from_cache() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let root = app.root(owner, "root").await;
    app.child(owner, &root, "first").await;

    let view = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(view.children.len(), 1);
    assert_eq!(cached_names(&app, owner).await, Some(vec!["first".to_string()]));

    // A write behind the engine's back is not seen until invalidation.
    let mut hidden = app.folders_of(owner).await.remove(0);
    hidden.id = uuid::Uuid::new_v4();
    hidden.name = "hidden".to_string();
    hidden.parent_id = root.id;
    hidden.created_at = Utc::now();
    app.write_behind_engine(&hidden).await;

    let again = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(again.children.len(), 1);

    app.platform.root_cache.invalidate(owner).await.unwrap();
    let fresh = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(fresh.children.len(), 2);
}

#[tokio::test]
async fn test_missing_root_is_not_cached() {
    let app = TestApp::new().await;
    let owner = app.user().await;

    assert!(app.platform.folders.get_root(owner).await.unwrap().is_none());
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());

    app.root(owner, "late").await;
    let root = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(root.name, "late");
}

#[tokio::test]
async fn test_mutations_invalidate_owner_root() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let root = app.root(owner, "root").await;
    let folders = &app.platform.folders;

    folders.get_root(owner).await.unwrap();
    let child = app.child(owner, &root, "child").await;
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());

    folders.get_root(owner).await.unwrap();
    let layer = app.layer(owner, &child, "roads", "postgis").await;
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());
    let tree = folders.get_root(owner).await.unwrap().unwrap();
    assert!(tree.children[0].is_channel);

    app.platform.layers.delete_layer(layer.id).await.unwrap();
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());
    let tree = folders.get_root(owner).await.unwrap().unwrap();
    assert!(!tree.children[0].is_channel);

    let child_view = folders.get_folder(id_of(&child)).await.unwrap();
    folders.delete_folder(&child_view).await.unwrap();
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());
    let tree = folders.get_root(owner).await.unwrap().unwrap();
    assert!(tree.children.is_empty());
}

#[tokio::test]
async fn test_copy_invalidates_target_only() {
    let app = TestApp::new().await;
    let (source, target) = (app.user().await, app.group().await);
    let origin = app.root(source, "origin").await;
    app.child(source, &origin, "inside").await;
    app.root(target, "target").await;
    let folders = &app.platform.folders;

    folders.get_root(source).await.unwrap();
    folders.get_root(target).await.unwrap();

    folders.copy_user_context(source, target, false).await.unwrap();

    assert!(app.platform.root_cache.get(source).await.unwrap().is_some());
    assert!(app.platform.root_cache.get(target).await.unwrap().is_none());
    let root = folders.get_root(target).await.unwrap().unwrap();
    assert_eq!(root.name, "origin");
}

#[tokio::test]
async fn test_foreign_child_invalidates_ancestor_owner() {
    let app = TestApp::new().await;
    let (owner, guest) = (app.user().await, app.user().await);
    let root = app.root(owner, "root").await;
    let shared = app.child(owner, &root, "shared").await;

    app.platform.folders.get_root(owner).await.unwrap();
    // A folder owned by someone else, placed inside the owner's tree.
    let guest_folder = app.child(guest, &shared, "guest").await;
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());

    let tree = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(tree.children[0].children[0].id, guest_folder.id);

    app.platform.folders.get_root(owner).await.unwrap();
    app.layer(guest, &guest_folder, "guest_layer", "WMS").await;
    assert!(app.platform.root_cache.get(owner).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_operation_keeps_cache() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.user().await);
    let origin = app.root(u1, "origin").await;
    app.child(u1, &origin, "a").await;
    app.root(u2, "kept").await;

    app.platform.folders.get_root(u2).await.unwrap();
    app.faults.fail_folder_writes_after(1);
    assert!(
        app.platform
            .folders
            .copy_user_context(u1, u2, false)
            .await
            .is_err()
    );
    app.faults.clear();

    let cached = app.platform.root_cache.get(u2).await.unwrap().unwrap();
    assert_eq!(cached.name, "kept");
}

#[tokio::test]
async fn test_stale_ticket_cannot_populate() {
    let app = TestApp::new().await;
    let owner = app.group().await;
    let root = app.root(owner, "root").await;
    let cache = &app.platform.root_cache;

    let ticket = cache.ticket(owner);
    assert_eq!(ticket.owner(), owner);
    app.child(owner, &root, "newer").await;

    assert!(!cache.put_if_current(ticket, &root).await.unwrap());
    assert!(cache.get(owner).await.unwrap().is_none());

    let fresh = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert_eq!(fresh.children.len(), 1);
    assert_eq!(cached_names(&app, owner).await, Some(vec!["newer".to_string()]));
}

#[tokio::test]
async fn test_flush_drops_every_root() {
    let app = TestApp::new().await;
    let (a, b) = (app.user().await, app.group().await);
    app.root(a, "a").await;
    app.root(b, "b").await;
    let cache = &app.platform.root_cache;

    app.platform.folders.get_root(a).await.unwrap();
    let ticket = cache.ticket(b);
    cache.flush_all().await.unwrap();

    assert!(cache.get(a).await.unwrap().is_none());
    let view = FolderView::new("b", b);
    assert!(!cache.put_if_current(ticket, &view).await.unwrap());
}

#[tokio::test]
async fn test_health_check_without_database() {
    let app = TestApp::new().await;
    let report = app.platform.health_check().await;
    assert_eq!(report.database, None);
    assert!(report.cache);
    assert!(report.catalog);
}

#[tokio::test]
async fn test_committed_change_survives_cache_outage() {
    let outage = OutageCache::default();
    let app = TestApp::with_cache(Arc::new(outage.clone()));
    let (origin, target) = (app.user().await, app.user().await);
    let root = app.root(origin, "origin").await;
    app.child(origin, &root, "roads").await;
    let target_root = app.root(target, "target").await;
    app.platform.folders.get_root(target).await.unwrap();

    outage.fail_deletes();
    let copied = app
        .platform
        .folders
        .copy_user_context(origin, target, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied.name, "origin");
    assert_eq!(copied.parent_id, target_root.id);

    // Reported once, stored once: a caller has no reason to retry.
    assert_eq!(app.roots_of(target).await.len(), 1);
    assert_eq!(app.folders_of(target).await.len(), 3);
}
