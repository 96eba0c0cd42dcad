//! Materialized folder views for external consumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classification::Classification;
use super::model::Folder;
use crate::owner::Owner;

/// A folder together with its derived classification and its
/// materialized sub-folders.
///
/// The same type is accepted by `save`: a view without `id` is inserted,
/// a view with `id` replaces every field of the stored record. The
/// `children` list is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderView {
    /// Folder ID (absent for folders not yet saved).
    pub id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Whether the folder is visible to consumers.
    pub enabled: bool,
    /// Derived channel flag. On save it is stored as the channel hint.
    pub is_channel: bool,
    /// Ordering key among siblings.
    pub order: Option<i32>,
    /// Owning user.
    pub user_id: Option<Uuid>,
    /// Owning group.
    pub group_id: Option<Uuid>,
    /// Parent folder.
    pub parent_id: Option<Uuid>,
    /// Zone.
    pub zone_id: Option<Uuid>,
    /// Folder type.
    pub folder_type_id: Option<Uuid>,
    /// Sharing authority.
    pub authority_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Sub-folders in store order.
    #[serde(default)]
    pub children: Vec<FolderView>,
}

impl FolderView {
    /// Start a new, unsaved folder for `owner`.
    pub fn new(name: impl Into<String>, owner: Owner) -> Self {
        let (user_id, group_id) = owner.columns();
        Self {
            id: None,
            name: name.into(),
            enabled: true,
            is_channel: false,
            order: None,
            user_id,
            group_id,
            parent_id: None,
            zone_id: None,
            folder_type_id: None,
            authority_id: None,
            created_at: None,
            updated_at: None,
            children: Vec::new(),
        }
    }

    /// Place the folder under `parent_id`.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Assign a zone.
    pub fn with_zone(mut self, zone_id: Uuid) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    /// Assign a folder type.
    pub fn with_type(mut self, folder_type_id: Uuid) -> Self {
        self.folder_type_id = Some(folder_type_id);
        self
    }

    /// Set the ordering key.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the channel hint.
    pub fn with_channel_hint(mut self, is_channel: bool) -> Self {
        self.is_channel = is_channel;
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build a view from a stored record.
    pub fn from_folder(
        folder: &Folder,
        classification: Classification,
        children: Vec<FolderView>,
    ) -> Self {
        Self {
            id: Some(folder.id),
            name: folder.name.clone(),
            enabled: folder.enabled,
            is_channel: classification.is_channel(),
            order: folder.folder_order,
            user_id: folder.user_id,
            group_id: folder.group_id,
            parent_id: folder.parent_id,
            zone_id: folder.zone_id,
            folder_type_id: folder.folder_type_id,
            authority_id: folder.authority_id,
            created_at: Some(folder.created_at),
            updated_at: Some(folder.updated_at),
            children,
        }
    }

    /// The folder owner, if any.
    pub fn owner(&self) -> Option<Owner> {
        Owner::from_columns(self.user_id, self.group_id)
    }

    /// The classification carried by this view.
    pub fn classification(&self) -> Classification {
        if self.is_channel {
            Classification::Channel
        } else {
            Classification::Container
        }
    }

    /// IDs of this folder and every descendant, depth-first, parents first.
    pub fn subtree_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<Uuid>) {
        if let Some(id) = self.id {
            ids.push(id);
        }
        for child in &self.children {
            child.collect_ids(ids);
        }
    }

    /// Number of folders in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(FolderView::subtree_len).sum::<usize>()
    }
}
