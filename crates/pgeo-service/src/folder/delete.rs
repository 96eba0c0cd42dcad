//! Cascading deletion of folder subtrees.

use std::collections::HashSet;

use futures::future::BoxFuture;
use tracing::{debug, info};
use uuid::Uuid;

use pgeo_core::result::AppResult;
use pgeo_entity::folder::{Folder, FolderView};

use super::service::FolderService;
use super::unit::TreeUnitOfWork;

impl FolderService {
    /// Deletes a folder with every layer and descendant folder.
    ///
    /// Children are read from the store, not from `view`. Deleting a
    /// folder that does not exist (anymore) does nothing.
    pub async fn delete_folder(&self, view: &FolderView) -> AppResult<()> {
        let Some(folder_id) = view.id else {
            debug!(name = %view.name, "Unsaved folder, nothing to delete");
            return Ok(());
        };

        let mut unit =
            TreeUnitOfWork::begin_cascade(self.store.as_ref(), &self.cache, "delete_folder")
                .await?;
        let result = delete_in(&mut unit, folder_id, view).await;
        let removed = unit.finish(result).await?;
        if removed > 0 {
            info!(folder_id = %folder_id, removed, "Folder subtree deleted");
        }
        Ok(())
    }
}

async fn delete_in(
    unit: &mut TreeUnitOfWork,
    folder_id: Uuid,
    view: &FolderView,
) -> AppResult<usize> {
    let Some(folder) = unit.tx().find_folder(folder_id).await? else {
        debug!(folder_id = %folder_id, "Folder already gone");
        return Ok(0);
    };

    let current: HashSet<Uuid> = unit
        .tx()
        .find_children(folder_id)
        .await?
        .iter()
        .map(|child| child.id)
        .collect();
    for stale in view
        .children
        .iter()
        .filter_map(|child| child.id)
        .filter(|id| !current.contains(id))
    {
        debug!(folder_id = %folder_id, child_id = %stale, "Ignoring stale child reference");
    }

    delete_subtree(unit, folder).await
}

/// Delete the layers of `folder`, then its children depth-first, then the
/// folder itself. Returns the number of folders removed.
pub(super) fn delete_subtree<'a>(
    unit: &'a mut TreeUnitOfWork,
    folder: Folder,
) -> BoxFuture<'a, AppResult<usize>> {
    Box::pin(async move {
        unit.enter(folder.id);

        let layers = unit.tx().find_layers_by_folder(folder.id).await?;
        for layer in &layers {
            unit.delete_layer(layer).await?;
        }

        let children = unit.tx().find_children(folder.id).await?;
        let mut removed = 0;
        for child in children {
            removed += delete_subtree(&mut *unit, child).await?;
        }

        unit.enter(folder.id);
        unit.delete_folder(&folder).await?;
        debug!(folder_id = %folder.id, layers = layers.len(), "Folder node deleted");
        Ok(removed + 1)
    })
}
