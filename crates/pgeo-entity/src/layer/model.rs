//! Layer entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use pgeo_core::result::AppResult;

use crate::catalog::ResourceKind;
use crate::owner::Owner;

/// A leaf of the content tree, backed by a resource in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Layer {
    /// Unique layer identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Title shown in legends.
    pub title: Option<String>,
    /// The folder holding this layer.
    pub folder_id: Uuid,
    /// Owning user.
    pub user_id: Option<Uuid>,
    /// Owning group.
    pub group_id: Option<Uuid>,
    /// Resource type tag (`postgis`, `geotiff`, `imagemosaic`, `imageworld`, `WFS`).
    pub layer_type: Option<String>,
    /// Catalog workspace.
    pub workspace: Option<String>,
    /// Resource name in the catalog.
    pub server_resource: Option<String>,
    /// Backing table for vectorial layers.
    pub table_name: Option<String>,
    /// Catalog style name.
    pub style_name: Option<String>,
    /// Geometry type of vectorial layers.
    pub geometry_type: Option<String>,
    /// Ordering key within the folder.
    pub layer_order: Option<i32>,
    /// Whether the layer is visible to consumers.
    pub enabled: bool,
    /// Whether the catalog currently holds this layer's resource.
    pub published: bool,
    /// When the layer was created.
    pub created_at: DateTime<Utc>,
    /// When the layer was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Layer {
    /// Create a new, unpublished layer in `folder_id`.
    pub fn new(name: impl Into<String>, folder_id: Uuid, owner: Owner) -> Self {
        let (user_id, group_id) = owner.columns();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            title: None,
            folder_id,
            user_id,
            group_id,
            layer_type: None,
            workspace: None,
            server_resource: None,
            table_name: None,
            style_name: None,
            geometry_type: None,
            layer_order: None,
            enabled: true,
            published: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The layer owner, if any.
    pub fn owner(&self) -> Option<Owner> {
        Owner::from_columns(self.user_id, self.group_id)
    }

    /// Clone this layer into another folder and owner with a fresh identity.
    ///
    /// The clone still names the source's catalog resource, so it can be
    /// duplicated from it, but it never owns that resource: it starts
    /// unpublished.
    pub fn clone_into(&self, folder_id: Uuid, owner: Owner) -> Self {
        let (user_id, group_id) = owner.columns();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            folder_id,
            user_id,
            group_id,
            published: false,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Parse the stored resource type tag.
    pub fn resource_kind(&self) -> AppResult<ResourceKind> {
        match self.layer_type.as_deref() {
            Some(tag) => tag.parse(),
            None => Err(pgeo_core::AppError::validation(format!(
                "Layer {} has no resource type",
                self.id
            ))),
        }
    }
}
