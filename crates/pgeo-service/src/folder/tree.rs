//! Materialization of stored folders into views.

use futures::future::BoxFuture;

use pgeo_core::result::AppResult;
use pgeo_database::TreeTransaction;
use pgeo_entity::folder::{Folder, FolderView, classify};

/// Build the view of `folder` with every descendant, classifying each
/// node from its current sub-folders and layers.
pub fn materialize<'a>(
    tx: &'a mut dyn TreeTransaction,
    folder: Folder,
) -> BoxFuture<'a, AppResult<FolderView>> {
    Box::pin(async move {
        let children = tx.find_children(folder.id).await?;
        let has_layers = !tx.find_layers_by_folder(folder.id).await?.is_empty();
        let classification = classify(&folder, !children.is_empty(), has_layers);

        let mut views = Vec::with_capacity(children.len());
        for child in children {
            views.push(materialize(&mut *tx, child).await?);
        }

        Ok(FolderView::from_folder(&folder, classification, views))
    })
}

/// Materialize every folder of a query result, keeping its order.
pub async fn materialize_all(
    tx: &mut dyn TreeTransaction,
    folders: Vec<Folder>,
) -> AppResult<Vec<FolderView>> {
    let mut views = Vec::with_capacity(folders.len());
    for folder in folders {
        views.push(materialize(&mut *tx, folder).await?);
    }
    Ok(views)
}
