//! Folder and folder type records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::owner::Owner;

/// A folder in an owner's content tree.
///
/// Children are not stored on the record; they are found by looking up
/// folders whose `parent_id` points here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the folder is visible to consumers.
    pub enabled: bool,
    /// Explicit channel hint, only used when the folder has neither
    /// sub-folders nor layers.
    pub is_channel: Option<bool>,
    /// Ordering key among siblings.
    pub folder_order: Option<i32>,
    /// Owning user.
    pub user_id: Option<Uuid>,
    /// Owning group.
    pub group_id: Option<Uuid>,
    /// Parent folder ID (null for root folders).
    pub parent_id: Option<Uuid>,
    /// Zone the folder belongs to.
    pub zone_id: Option<Uuid>,
    /// Folder type from the type taxonomy.
    pub folder_type_id: Option<Uuid>,
    /// Authority the folder is shared with.
    pub authority_id: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The folder owner, if any.
    pub fn owner(&self) -> Option<Owner> {
        Owner::from_columns(self.user_id, self.group_id)
    }

    /// Replace both owner columns.
    pub fn set_owner(&mut self, owner: Owner) {
        let (user_id, group_id) = owner.columns();
        self.user_id = user_id;
        self.group_id = group_id;
    }
}

/// A node of the folder type taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FolderType {
    /// Unique type identifier.
    pub id: Uuid,
    /// Short machine tag, e.g. `"thematic"`.
    pub type_tag: String,
    /// Human readable title.
    pub title: String,
    /// Parent type (null for top-level types).
    pub parent_id: Option<Uuid>,
}
