//! Folder type taxonomy lookups.

use uuid::Uuid;

use pgeo_core::result::AppResult;
use pgeo_entity::folder::FolderType;

use super::service::FolderService;

impl FolderService {
    /// Every folder type, ordered by title.
    pub async fn all_folder_types(&self) -> AppResult<Vec<FolderType>> {
        let mut tx = self.store.begin().await?;
        let types = tx.list_folder_types().await?;
        tx.commit().await?;
        Ok(types)
    }

    /// Every folder type whose tag is not in `tags`.
    pub async fn folder_types_excluding(&self, tags: &[&str]) -> AppResult<Vec<FolderType>> {
        let types = self.all_folder_types().await?;
        Ok(types
            .into_iter()
            .filter(|t| !tags.contains(&t.type_tag.as_str()))
            .collect())
    }

    /// Folder types no other type uses as parent.
    pub async fn leaf_folder_types(&self) -> AppResult<Vec<FolderType>> {
        Ok(leaves(self.all_folder_types().await?))
    }

    /// Direct children of a type, or top-level types for `None`.
    pub async fn folder_types(&self, parent_id: Option<Uuid>) -> AppResult<Vec<FolderType>> {
        let types = self.all_folder_types().await?;
        Ok(types
            .into_iter()
            .filter(|t| t.parent_id == parent_id)
            .collect())
    }
}

fn leaves(types: Vec<FolderType>) -> Vec<FolderType> {
    let parents: Vec<Uuid> = types.iter().filter_map(|t| t.parent_id).collect();
    types
        .into_iter()
        .filter(|t| !parents.contains(&t.id))
        .collect()
}
