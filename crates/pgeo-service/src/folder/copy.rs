//! Deep copy of a folder subtree to another owner.

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{debug, info};
use uuid::Uuid;

use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_database::ReferenceKind;
use pgeo_entity::folder::{Folder, FolderView};
use pgeo_entity::owner::Owner;

use super::service::{FolderService, ensure_outside};
use super::tree::materialize;
use super::unit::TreeUnitOfWork;

impl FolderService {
    /// Copies `source` and everything below it to `target`, under
    /// `new_parent_id` or as a new root.
    ///
    /// The source is re-read from the store; only its id is taken from
    /// the caller. Every copied folder and layer gets a fresh id, the
    /// sharing authority is cleared.
    pub async fn copy_folder(
        &self,
        target: Owner,
        source: &FolderView,
        new_parent_id: Option<Uuid>,
    ) -> AppResult<FolderView> {
        let source_id = source
            .id
            .ok_or_else(|| AppError::validation("Cannot copy a folder that was never saved"))?;

        let mut unit =
            TreeUnitOfWork::begin_cascade(self.store.as_ref(), &self.cache, "copy_folder").await?;
        let result = copy_in(&mut unit, target, source_id, new_parent_id).await;
        let copied = unit.finish(result).await?;
        info!(
            source_id = %source_id,
            copy_id = ?copied.id,
            %target,
            folders = copied.subtree_len(),
            "Folder copied"
        );
        Ok(copied)
    }
}

async fn copy_in(
    unit: &mut TreeUnitOfWork,
    target: Owner,
    source_id: Uuid,
    new_parent_id: Option<Uuid>,
) -> AppResult<FolderView> {
    unit.require(ReferenceKind::of_owner(&target), target.id())
        .await?;
    let source = unit
        .tx()
        .find_folder(source_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Folder {source_id} not found")))?;

    if let Some(parent_id) = new_parent_id {
        unit.require(ReferenceKind::Folder, parent_id).await?;
        // Copying into its own subtree would never terminate.
        ensure_outside(unit.tx(), parent_id, source_id).await?;
    }

    let copied = copy_subtree(unit, source, target, new_parent_id).await?;
    materialize(unit.tx(), copied).await
}

/// Insert a copy of `source` owned by `owner` under `parent_id`, then its
/// layers, then recursively its children in store order.
pub(super) fn copy_subtree<'a>(
    unit: &'a mut TreeUnitOfWork,
    source: Folder,
    owner: Owner,
    parent_id: Option<Uuid>,
) -> BoxFuture<'a, AppResult<Folder>> {
    Box::pin(async move {
        unit.enter(source.id);

        let now = Utc::now();
        let mut copy = Folder {
            id: Uuid::new_v4(),
            parent_id,
            authority_id: None,
            created_at: now,
            updated_at: now,
            ..source.clone()
        };
        copy.set_owner(owner);
        let copy = unit.upsert_folder(&copy).await?;

        let layers = unit.tx().find_layers_by_folder(source.id).await?;
        for layer in &layers {
            unit.upsert_layer(&layer.clone_into(copy.id, owner)).await?;
        }

        let children = unit.tx().find_children(source.id).await?;
        for child in children {
            copy_subtree(&mut *unit, child, owner, Some(copy.id)).await?;
        }

        debug!(
            source_id = %source.id,
            copy_id = %copy.id,
            layers = layers.len(),
            "Folder node copied"
        );
        Ok(copy)
    })
}
