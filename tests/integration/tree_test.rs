//! Integration tests for the folder tree engine.

mod helpers;

use std::collections::HashSet;

use uuid::Uuid;

use helpers::{TestApp, id_of, shape};
use pgeo_core::error::ErrorKind;
use pgeo_entity::folder::FolderView;
use pgeo_service::FolderQuery;

#[tokio::test]
async fn test_classification_follows_children_and_layers() {
    let app = TestApp::new().await;
    let owner = app.user().await;

    let root = app
        .save(FolderView::new("root", owner).with_channel_hint(true))
        .await;
    let with_layer = app.child(owner, &root, "roads").await;
    app.layer(owner, &with_layer, "roads", "postgis").await;
    let hinted = app
        .save(
            FolderView::new("hinted", owner)
                .with_parent(id_of(&root))
                .with_channel_hint(true),
        )
        .await;
    app.child(owner, &root, "empty").await;
    app.layer(owner, &root, "base", "geotiff").await;

    let tree = app.platform.folders.get_root(owner).await.unwrap().unwrap();
    assert!(!tree.is_channel, "children make a container despite hint and layer");

    let by_name = |name: &str| {
        tree.children
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap()
    };
    assert!(by_name("roads").is_channel);
    assert!(by_name("hinted").is_channel);
    assert!(!by_name("empty").is_channel);
    assert_eq!(by_name("hinted").id, hinted.id);
}

#[tokio::test]
async fn test_chained_copies_are_isomorphic_and_disjoint() {
    let app = TestApp::new().await;
    let (source_owner, first, second) = (app.user().await, app.user().await, app.group().await);

    let root = app.root(source_owner, "T").await;
    let a = app.child(source_owner, &root, "a").await;
    app.child(source_owner, &a, "a1").await;
    app.layer(source_owner, &a, "l1", "postgis").await;
    let b = app.child(source_owner, &root, "b").await;
    app.layer(source_owner, &b, "l2", "WFS").await;
    app.layer(source_owner, &b, "l3", "geotiff").await;
    let source = app.platform.folders.get_folder(id_of(&root)).await.unwrap();

    let folders = &app.platform.folders;
    let mut copies = Vec::new();
    for _ in 0..2 {
        let intermediate = folders.copy_folder(first, &source, None).await.unwrap();
        copies.push(folders.copy_folder(second, &intermediate, None).await.unwrap());
    }

    assert_eq!(shape(&copies[0]), shape(&source));
    assert_eq!(shape(&copies[1]), shape(&source));

    let source_ids: HashSet<Uuid> = source.subtree_ids().into_iter().collect();
    let first_ids: HashSet<Uuid> = copies[0].subtree_ids().into_iter().collect();
    let second_ids: HashSet<Uuid> = copies[1].subtree_ids().into_iter().collect();
    assert_eq!(first_ids.len(), 4);
    assert!(first_ids.is_disjoint(&second_ids));
    assert!(first_ids.is_disjoint(&source_ids));
    assert!(second_ids.is_disjoint(&source_ids));

    // Two copies of three layers each, all with fresh ids.
    let layers = app.layers_of(second).await;
    assert_eq!(layers.len(), 6);
    let source_layers: HashSet<Uuid> =
        app.layers_of(source_owner).await.iter().map(|l| l.id).collect();
    assert!(layers.iter().all(|l| !source_layers.contains(&l.id)));
    assert!(copies.iter().all(|c| c.group_id == second.columns().1));
}

#[tokio::test]
async fn test_copy_clears_authority_and_keeps_zone_and_type() {
    let app = TestApp::new().await;
    let (owner, target) = (app.user().await, app.user().await);
    let zone = app.zone().await;
    let authority = app.authority().await;
    let folder_type = app.folder_type("thematic", None).await;

    let mut view = FolderView::new("shared", owner)
        .with_zone(zone)
        .with_type(folder_type.id)
        .with_order(3);
    view.authority_id = Some(authority);
    let source = app.save(view).await;

    let copy = app
        .platform
        .folders
        .copy_folder(target, &source, None)
        .await
        .unwrap();

    assert_ne!(copy.id, source.id);
    assert_eq!(copy.owner(), Some(target));
    assert_eq!(copy.authority_id, None);
    assert_eq!(copy.zone_id, Some(zone));
    assert_eq!(copy.folder_type_id, Some(folder_type.id));
    assert_eq!(copy.order, Some(3));
}

#[tokio::test]
async fn test_copy_under_parent_and_into_own_subtree() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let root = app.root(owner, "root").await;
    let inner = app.child(owner, &root, "inner").await;
    let elsewhere = app.root(app.user().await, "elsewhere").await;

    let copy = app
        .platform
        .folders
        .copy_folder(owner, &inner, elsewhere.id)
        .await
        .unwrap();
    assert_eq!(copy.parent_id, elsewhere.id);

    let err = app
        .platform
        .folders
        .copy_folder(owner, &root, inner.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    let err = app
        .platform
        .folders
        .copy_folder(owner, &root, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ReferenceNotFound));
}

#[tokio::test]
async fn test_copy_of_missing_source() {
    let app = TestApp::new().await;
    let owner = app.user().await;

    let mut ghost = FolderView::new("ghost", owner);
    ghost.id = Some(Uuid::new_v4());
    let err = app
        .platform
        .folders
        .copy_folder(owner, &ghost, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));

    let unsaved = FolderView::new("unsaved", owner);
    let err = app
        .platform
        .folders
        .copy_folder(owner, &unsaved, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}

#[tokio::test]
async fn test_delete_is_complete_and_idempotent() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let root = app.root(owner, "root").await;
    let doomed = app.child(owner, &root, "doomed").await;
    let deep = app.child(owner, &doomed, "deep").await;
    app.child(owner, &deep, "deeper").await;
    app.layer(owner, &doomed, "l1", "postgis").await;
    app.layer(owner, &deep, "l2", "imagemosaic").await;
    let kept = app.child(owner, &root, "kept").await;
    app.layer(owner, &kept, "l3", "postgis").await;

    let doomed_view = app.platform.folders.get_folder(id_of(&doomed)).await.unwrap();
    let doomed_ids = doomed_view.subtree_ids();
    app.platform.folders.delete_folder(&doomed_view).await.unwrap();

    let remaining: HashSet<Uuid> = app.store.folders().await.iter().map(|f| f.id).collect();
    assert!(doomed_ids.iter().all(|id| !remaining.contains(id)));
    assert_eq!(remaining.len(), 2);
    let layers = app.store.layers().await;
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "l3");

    app.platform.folders.delete_folder(&doomed_view).await.unwrap();
    assert_eq!(app.store.folder_count().await, 2);

    let err = app
        .platform
        .folders
        .get_folder(id_of(&doomed))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_delete_uses_store_children_not_view() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let root = app.root(owner, "root").await;
    let target = app.child(owner, &root, "target").await;
    let sibling = app.child(owner, &root, "sibling").await;

    // A stale view claims the sibling as a child and misses the real one.
    let mut stale = target.clone();
    stale.children = vec![sibling.clone()];
    app.child(owner, &target, "real_child").await;

    app.platform.folders.delete_folder(&stale).await.unwrap();

    let names: Vec<String> = app.store.folders().await.into_iter().map(|f| f.name).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"sibling".to_string()));
}

#[tokio::test]
async fn test_copy_user_context_replaces_target_tree() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.user().await);

    let r = app.root(u1, "R").await;
    let c = app.child(u1, &r, "C").await;
    let l1 = app.layer(u1, &c, "leaf1", "postgis").await;
    let l2 = app.layer(u1, &c, "leaf2", "geotiff").await;

    let old_root = app.root(u2, "old").await;
    app.child(u2, &old_root, "old_child").await;
    app.layer(u2, &old_root, "old_leaf", "postgis").await;

    let copied = app
        .platform
        .folders
        .copy_user_context(u1, u2, false)
        .await
        .unwrap()
        .unwrap();

    let roots = app.roots_of(u2).await;
    assert_eq!(roots.len(), 1);
    assert_eq!(Some(roots[0].id), copied.id);
    assert_ne!(copied.id, r.id);
    assert_eq!(copied.name, "R");
    assert!(app.folders_of(u2).await.iter().all(|f| f.name != "old_child"));

    assert_eq!(copied.children.len(), 1);
    let c_copy = &copied.children[0];
    assert_eq!(c_copy.owner(), Some(u2));
    assert!(c_copy.is_channel);
    assert_ne!(c_copy.id, c.id);

    let leaves = app
        .platform
        .layers
        .layers_by_folder(id_of(c_copy))
        .await
        .unwrap();
    assert_eq!(leaves.len(), 2);
    assert!(leaves.iter().all(|l| l.id != l1.id && l.id != l2.id));
    assert!(leaves.iter().all(|l| l.owner() == Some(u2)));
    assert_eq!(app.layers_of(u2).await.len(), 2);

    // The origin is untouched.
    assert_eq!(app.folders_of(u1).await.len(), 2);
    assert_eq!(app.layers_of(u1).await.len(), 2);
}

#[tokio::test]
async fn test_copy_user_context_merge_keeps_single_root() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.group().await);
    let origin = app.root(u1, "origin").await;
    app.child(u1, &origin, "inside").await;
    let existing = app.root(u2, "existing").await;

    let copied = app
        .platform
        .folders
        .copy_user_context(u1, u2, true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(copied.parent_id, existing.id);
    let roots = app.roots_of(u2).await;
    assert_eq!(roots.len(), 1);
    assert_eq!(Some(roots[0].id), existing.id);

    let tree = app.platform.folders.get_root(u2).await.unwrap().unwrap();
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].children[0].name, "inside");
}

#[tokio::test]
async fn test_copy_user_context_without_origin_root() {
    let app = TestApp::new().await;
    let (u1, u2, u3) = (app.user().await, app.user().await, app.user().await);
    app.root(u2, "doomed").await;
    app.root(u3, "kept").await;

    let merged = app
        .platform
        .folders
        .copy_user_context(u1, u3, true)
        .await
        .unwrap();
    assert!(merged.is_none());
    assert_eq!(app.roots_of(u3).await.len(), 1);

    let replaced = app
        .platform
        .folders
        .copy_user_context(u1, u2, false)
        .await
        .unwrap();
    assert!(replaced.is_none());
    assert!(app.roots_of(u2).await.is_empty());
}

#[tokio::test]
async fn test_copy_user_context_to_unknown_owner() {
    let app = TestApp::new().await;
    let u1 = app.user().await;
    app.root(u1, "root").await;

    let stranger = pgeo_entity::owner::Owner::User(Uuid::new_v4());
    let err = app
        .platform
        .folders
        .copy_user_context(u1, stranger, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ReferenceNotFound));
}

#[tokio::test]
async fn test_delete_user_context_removes_every_root() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let first = app.root(owner, "first").await;
    app.child(owner, &first, "child").await;
    app.root(owner, "second").await;
    let other = app.user().await;
    app.root(other, "other").await;

    let removed = app
        .platform
        .folders
        .delete_user_context(owner)
        .await
        .unwrap();

    assert_eq!(removed, 3);
    assert!(app.folders_of(owner).await.is_empty());
    assert_eq!(app.folders_of(other).await.len(), 1);
}

#[tokio::test]
async fn test_failed_copy_rolls_back_everything() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.user().await);
    let root = app.root(u1, "root").await;
    let a = app.child(u1, &root, "a").await;
    app.child(u1, &a, "a1").await;
    app.layer(u1, &a, "la", "postgis").await;
    app.root(u2, "previous").await;
    let before = app.store.folder_count().await;

    app.faults.fail_folder_writes_after(2);
    let err = app
        .platform
        .folders
        .copy_user_context(u1, u2, false)
        .await
        .unwrap_err();
    app.faults.clear();

    assert!(err.is(ErrorKind::CascadeFailure));
    assert!(err.message.contains("copy_user_context failed at folder"));
    let cause = std::error::Error::source(&err).expect("cause kept");
    assert!(cause.to_string().contains("Injected folder write failure"));

    assert_eq!(app.store.folder_count().await, before);
    let roots = app.roots_of(u2).await;
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name, "previous");
    assert!(app.layers_of(u2).await.is_empty());
}

#[tokio::test]
async fn test_failure_before_any_write_is_not_a_cascade() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.user().await);
    let root = app.root(u1, "root").await;

    app.faults.fail_folder_writes_after(0);
    let err = app
        .platform
        .folders
        .copy_folder(u2, &root, None)
        .await
        .unwrap_err();
    app.faults.clear();

    assert!(err.is(ErrorKind::Database));
    assert_eq!(app.store.folder_count().await, 1);
}

#[tokio::test]
async fn test_context_deletion_gives_up_on_reappearing_root() {
    let app = TestApp::new().await;
    let (u1, u2) = (app.user().await, app.user().await);
    app.root(u1, "origin").await;
    let stubborn = app.root(u2, "stubborn").await;
    let stubborn_record = app
        .store
        .folders()
        .await
        .into_iter()
        .find(|f| Some(f.id) == stubborn.id)
        .unwrap();

    app.faults.keep_returning_root(stubborn_record);
    let err = app
        .platform
        .folders
        .copy_user_context(u1, u2, false)
        .await
        .unwrap_err();
    app.faults.clear();

    assert!(err.is(ErrorKind::Conflict));
    assert!(err.message.contains("4 deletion rounds"));
    assert_eq!(app.roots_of(u2).await.len(), 1);
}

#[tokio::test]
async fn test_root_folders_by_type_skips_disabled() {
    let app = TestApp::new().await;
    let folder_type = app.folder_type("basemap", None).await;
    let other_type = app.folder_type("thematic", None).await;

    for (name, order, enabled) in [("b", 2, true), ("a", 1, false), ("c", 3, true)] {
        let owner = app.user().await;
        app.save(
            FolderView::new(name, owner)
                .with_type(folder_type.id)
                .with_order(order)
                .with_enabled(enabled),
        )
        .await;
    }
    let owner = app.user().await;
    let untyped_root = app
        .save(FolderView::new("other", owner).with_type(other_type.id))
        .await;
    app.save(
        FolderView::new("nested", owner)
            .with_parent(id_of(&untyped_root))
            .with_type(folder_type.id),
    )
    .await;

    let roots = app
        .platform
        .folders
        .root_folders_by_type(folder_type.id)
        .await
        .unwrap();
    let names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);

    let every_typed = app
        .platform
        .folders
        .find_folders_by_type(folder_type.id)
        .await
        .unwrap();
    assert_eq!(every_typed.len(), 4);

    let enabled_roots = app.platform.folders.root_folders().await.unwrap();
    assert_eq!(enabled_roots.len(), 3);
}

#[tokio::test]
async fn test_zone_queries() {
    let app = TestApp::new().await;
    let owner = app.user().await;
    let zone = app.zone().await;

    let zoned_root = app.save(FolderView::new("zoned", owner).with_zone(zone)).await;
    let zoned_channel = app
        .save(
            FolderView::new("zoned_channel", owner)
                .with_zone(zone)
                .with_parent(id_of(&zoned_root)),
        )
        .await;
    app.layer(owner, &zoned_channel, "l", "postgis").await;
    let plain = app.save(FolderView::new("plain", owner)).await;
    let plain_channel = app.child(owner, &plain, "plain_channel").await;
    app.layer(owner, &plain_channel, "l", "postgis").await;

    let folders = &app.platform.folders;

    let in_zone = folders.find_by_zone(Some(zone), None).await.unwrap();
    assert_eq!(in_zone.len(), 2);
    let unzoned = folders.find_by_zone(None, Some(true)).await.unwrap();
    assert_eq!(unzoned.len(), 2);

    let zone_roots = folders
        .find_by_zone_and_parent(Some(zone), None, None)
        .await
        .unwrap();
    assert_eq!(zone_roots.len(), 1);
    assert_eq!(zone_roots[0].children.len(), 1);
    let under = folders
        .find_by_zone_and_parent(Some(zone), zoned_root.id, None)
        .await
        .unwrap();
    assert_eq!(under[0].name, "zoned_channel");

    let zoned_channels = folders
        .channel_folders(&FolderQuery {
            in_zone: Some(true),
            ..FolderQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(zoned_channels.len(), 1);
    assert_eq!(zoned_channels[0].name, "zoned_channel");

    let unzoned_channels = folders
        .channel_folders(&FolderQuery::default())
        .await
        .unwrap();
    assert_eq!(unzoned_channels.len(), 1);
    assert_eq!(unzoned_channels[0].name, "plain_channel");

    assert!(
        folders
            .find_by_zone(Some(Uuid::new_v4()), None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_folder_type_taxonomy() {
    let app = TestApp::new().await;
    let base = app.folder_type("base", None).await;
    let thematic = app.folder_type("thematic", Some(base.id)).await;
    let lone = app.folder_type("lone", None).await;

    let folders = &app.platform.folders;
    assert_eq!(folders.all_folder_types().await.unwrap().len(), 3);

    let without_base: Vec<String> = folders
        .folder_types_excluding(&["base"])
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.type_tag)
        .collect();
    assert_eq!(without_base, vec!["lone", "thematic"]);

    let leaves: Vec<_> = folders
        .leaf_folder_types()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(leaves, vec![lone.id, thematic.id]);

    let top: Vec<_> = folders
        .folder_types(None)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(top, vec![base.id, lone.id]);
    let under_base = folders.folder_types(Some(base.id)).await.unwrap();
    assert_eq!(under_base.len(), 1);
    assert_eq!(under_base[0].id, thematic.id);
}
