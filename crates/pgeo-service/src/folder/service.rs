//! Folder tree operations: root lookup, save and whole-context replacement.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pgeo_cache::RootFolderCache;
use pgeo_core::config::TreeConfig;
use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_database::{FolderFilter, ReferenceKind, TreeStore, TreeTransaction};
use pgeo_entity::folder::{Folder, FolderView};
use pgeo_entity::owner::Owner;

use super::copy::copy_subtree;
use super::delete::delete_subtree;
use super::tree::{materialize, materialize_all};
use super::unit::TreeUnitOfWork;

/// Manages the folder trees of users and groups.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Tree store.
    pub(super) store: Arc<dyn TreeStore>,
    /// Cache of materialized root folders.
    pub(super) cache: RootFolderCache,
    /// Engine settings.
    pub(super) config: TreeConfig,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(store: Arc<dyn TreeStore>, cache: RootFolderCache, config: TreeConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Gets the materialized root folder of an owner.
    ///
    /// Served from the cache when possible. A cache failure falls back to
    /// the store.
    pub async fn get_root(&self, owner: Owner) -> AppResult<Option<FolderView>> {
        match self.cache.get(owner).await {
            Ok(Some(view)) => {
                debug!(%owner, "Root folder served from cache");
                return Ok(Some(view));
            }
            Ok(None) => {}
            Err(e) => warn!(%owner, error = %e, "Root cache read failed, using store"),
        }

        let ticket = self.cache.ticket(owner);
        let mut tx = self.store.begin().await?;
        let view = match tx.find_root_by_owner(owner).await? {
            Some(root) => Some(materialize(tx.as_mut(), root).await?),
            None => None,
        };
        tx.commit().await?;

        if let Some(view) = &view {
            match self.cache.put_if_current(ticket, view).await {
                Ok(true) => debug!(%owner, "Root folder cached"),
                Ok(false) => debug!(%owner, "Root folder changed while reading, not cached"),
                Err(e) => warn!(%owner, error = %e, "Failed to cache root folder"),
            }
        }
        Ok(view)
    }

    /// Gets a folder by ID with all its descendants.
    pub async fn get_folder(&self, folder_id: Uuid) -> AppResult<FolderView> {
        let mut tx = self.store.begin().await?;
        let folder = tx
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        let view = materialize(tx.as_mut(), folder).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Inserts the folder if it has no id, otherwise replaces every field
    /// of the stored record. Returns the stored folder, materialized.
    pub async fn save_folder(&self, view: &FolderView) -> AppResult<FolderView> {
        let mut unit = TreeUnitOfWork::begin(self.store.as_ref(), &self.cache, "save_folder").await?;
        let result = save_in(&mut unit, view).await;
        let saved = unit.finish(result).await?;
        info!(
            folder_id = ?saved.id,
            name = %saved.name,
            parent_id = ?saved.parent_id,
            "Folder saved"
        );
        Ok(saved)
    }

    /// Replaces (or, with `merge`, extends) the tree of `target` with a
    /// copy of the tree of `origin`.
    ///
    /// Without `merge` every root of `target` is deleted first, even when
    /// `origin` has nothing to copy. With `merge` the copy is placed under
    /// the existing root of `target`, or becomes its root when it has none.
    /// A merged copy is never added as a second parentless root next to the
    /// existing one, which would leave `get_root` of `target` ambiguous.
    /// Returns the copied tree, or `None` when `origin` has no root.
    pub async fn copy_user_context(
        &self,
        origin: Owner,
        target: Owner,
        merge: bool,
    ) -> AppResult<Option<FolderView>> {
        if origin == target {
            return Err(AppError::validation(
                "Origin and target of a context copy must differ",
            ));
        }

        let mut unit =
            TreeUnitOfWork::begin_cascade(self.store.as_ref(), &self.cache, "copy_user_context")
                .await?;
        let result = self.replace_context(&mut unit, origin, target, merge).await;
        let copied = unit.finish(result).await?;
        info!(
            %origin,
            %target,
            merge,
            copied = copied.as_ref().map(FolderView::subtree_len).unwrap_or(0),
            "User context copied"
        );
        Ok(copied)
    }

    /// Deletes every root folder of `owner` with all their content.
    /// Returns the number of folders removed.
    pub async fn delete_user_context(&self, owner: Owner) -> AppResult<usize> {
        let mut unit =
            TreeUnitOfWork::begin_cascade(self.store.as_ref(), &self.cache, "delete_user_context")
                .await?;
        let result = self.clear_roots(&mut unit, owner).await;
        let removed = unit.finish(result).await?;
        info!(%owner, removed, "User context deleted");
        Ok(removed)
    }

    async fn replace_context(
        &self,
        unit: &mut TreeUnitOfWork,
        origin: Owner,
        target: Owner,
        merge: bool,
    ) -> AppResult<Option<FolderView>> {
        unit.require(ReferenceKind::of_owner(&target), target.id())
            .await?;

        let origin_root = unit.tx().find_root_by_owner(origin).await?;
        let parent_id = if merge {
            unit.tx()
                .find_root_by_owner(target)
                .await?
                .map(|root| root.id)
        } else {
            self.clear_roots(unit, target).await?;
            None
        };

        let Some(origin_root) = origin_root else {
            debug!(%origin, "Origin has no root folder, nothing to copy");
            return Ok(None);
        };
        let copied = copy_subtree(unit, origin_root, target, parent_id).await?;
        let view = materialize(unit.tx(), copied).await?;
        Ok(Some(view))
    }

    /// Delete roots of `owner` until none is left, re-reading after every
    /// deletion. Gives up with a conflict after the configured rounds.
    async fn clear_roots(&self, unit: &mut TreeUnitOfWork, owner: Owner) -> AppResult<usize> {
        let mut removed = 0;
        for round in 0..self.config.max_context_rounds {
            let Some(root) = unit.tx().find_root_by_owner(owner).await? else {
                return Ok(removed);
            };
            debug!(%owner, round, root_id = %root.id, "Deleting root folder");
            removed += delete_subtree(unit, root).await?;
        }

        if unit.tx().find_root_by_owner(owner).await?.is_none() {
            return Ok(removed);
        }
        Err(AppError::conflict(format!(
            "Owner {owner} still has root folders after {} deletion rounds",
            self.config.max_context_rounds
        )))
    }

    /// Run a folder query and materialize every match.
    pub(super) async fn query_views(&self, filter: FolderFilter) -> AppResult<Vec<FolderView>> {
        let mut tx = self.store.begin().await?;
        let folders = tx.find_folders(&filter).await?;
        let views = materialize_all(tx.as_mut(), folders).await?;
        tx.commit().await?;
        Ok(views)
    }
}

async fn save_in(unit: &mut TreeUnitOfWork, view: &FolderView) -> AppResult<FolderView> {
    if view.name.trim().is_empty() {
        return Err(AppError::validation("Folder name cannot be empty"));
    }
    let owner = view
        .owner()
        .ok_or_else(|| AppError::validation("Folder must belong to a user or a group"))?;
    unit.require(ReferenceKind::of_owner(&owner), owner.id())
        .await?;

    let existing = match view.id {
        Some(id) => Some(
            unit.tx()
                .find_folder(id)
                .await?
                .ok_or_else(|| AppError::reference_not_found(ReferenceKind::Folder, id))?,
        ),
        None => None,
    };
    let id = view.id.unwrap_or_else(Uuid::new_v4);

    if let Some(parent_id) = view.parent_id {
        if parent_id == id {
            return Err(AppError::validation("A folder cannot be its own parent"));
        }
        unit.require(ReferenceKind::Folder, parent_id).await?;
        if existing.is_some() {
            ensure_outside(unit.tx(), parent_id, id).await?;
        }
    }
    if let Some(zone_id) = view.zone_id {
        unit.require(ReferenceKind::Zone, zone_id).await?;
    }
    if let Some(type_id) = view.folder_type_id {
        unit.require(ReferenceKind::FolderType, type_id).await?;
    }
    if let Some(authority_id) = view.authority_id {
        unit.require(ReferenceKind::Authority, authority_id).await?;
    }

    // The tree the folder leaves changes too.
    if let Some(old) = &existing {
        unit.touch_folder(old).await?;
    }

    let now = Utc::now();
    let folder = Folder {
        id,
        name: view.name.clone(),
        enabled: view.enabled,
        is_channel: Some(view.is_channel),
        folder_order: view.order,
        user_id: view.user_id,
        group_id: view.group_id,
        parent_id: view.parent_id,
        zone_id: view.zone_id,
        folder_type_id: view.folder_type_id,
        authority_id: view.authority_id,
        created_at: existing.as_ref().map(|f| f.created_at).unwrap_or(now),
        updated_at: now,
    };
    let saved = unit.upsert_folder(&folder).await?;
    materialize(unit.tx(), saved).await
}

/// Fail with `Validation` when `start` or one of its ancestors is `subtree_root`.
pub(super) async fn ensure_outside(
    tx: &mut dyn TreeTransaction,
    start: Uuid,
    subtree_root: Uuid,
) -> AppResult<()> {
    let mut seen = HashSet::new();
    let mut next = Some(start);
    while let Some(id) = next {
        if id == subtree_root {
            return Err(AppError::validation(format!(
                "Folder {start} lies inside the subtree of {subtree_root}"
            )));
        }
        if !seen.insert(id) {
            break;
        }
        next = tx.find_folder(id).await?.and_then(|f| f.parent_id);
    }
    Ok(())
}
