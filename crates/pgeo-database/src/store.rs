//! Tree store contract.
//!
//! Every public engine operation opens exactly one [`TreeTransaction`],
//! performs all of its reads and writes through it and then commits or
//! rolls back. Other readers never observe the intermediate states of a
//! recursive copy or delete.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use pgeo_core::result::AppResult;
use pgeo_entity::folder::{Folder, FolderType};
use pgeo_entity::layer::Layer;
use pgeo_entity::owner::Owner;

/// Kinds of records that folders and layers reference by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A folder.
    Folder,
    /// A user.
    User,
    /// A group.
    Group,
    /// A zone.
    Zone,
    /// A folder type.
    FolderType,
    /// A sharing authority.
    Authority,
}

impl ReferenceKind {
    /// Table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Folder => "folders",
            Self::User => "users",
            Self::Group => "groups",
            Self::Zone => "zones",
            Self::FolderType => "folder_types",
            Self::Authority => "authorities",
        }
    }

    /// The reference kind matching an owner.
    pub fn of_owner(owner: &Owner) -> Self {
        if owner.is_group() { Self::Group } else { Self::User }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Folder => "folder",
            Self::User => "user",
            Self::Group => "group",
            Self::Zone => "zone",
            Self::FolderType => "folder type",
            Self::Authority => "authority",
        };
        f.write_str(name)
    }
}

/// Zone criterion of a folder query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneFilter {
    /// Any zone or none.
    #[default]
    Any,
    /// Only folders without a zone.
    Unzoned,
    /// Only folders with some zone.
    Zoned,
    /// Only folders of this zone.
    In(Uuid),
}

/// Parent criterion of a folder query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    /// Any position in the tree.
    #[default]
    Any,
    /// Only roots.
    Root,
    /// Only direct children of this folder.
    Under(Uuid),
}

/// Criteria for [`TreeTransaction::find_folders`].
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    /// Zone criterion.
    pub zone: ZoneFilter,
    /// Parent criterion.
    pub parent: ParentFilter,
    /// Enabled flag, when filtering on it.
    pub enabled: Option<bool>,
    /// Folder type, when filtering on it.
    pub folder_type: Option<Uuid>,
}

impl FolderFilter {
    /// Whether `folder` satisfies every criterion.
    pub fn matches(&self, folder: &Folder) -> bool {
        let zone_ok = match self.zone {
            ZoneFilter::Any => true,
            ZoneFilter::Unzoned => folder.zone_id.is_none(),
            ZoneFilter::Zoned => folder.zone_id.is_some(),
            ZoneFilter::In(zone) => folder.zone_id == Some(zone),
        };
        let parent_ok = match self.parent {
            ParentFilter::Any => true,
            ParentFilter::Root => folder.parent_id.is_none(),
            ParentFilter::Under(parent) => folder.parent_id == Some(parent),
        };
        zone_ok
            && parent_ok
            && self.enabled.is_none_or(|enabled| folder.enabled == enabled)
            && self
                .folder_type
                .is_none_or(|kind| folder.folder_type_id == Some(kind))
    }
}

/// Factory for tree transactions.
#[async_trait]
pub trait TreeStore: Send + Sync + fmt::Debug + 'static {
    /// Open a transaction. Dropping it without commit rolls it back.
    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>>;
}

/// All reads and writes of the folder engine.
///
/// Query results are ordered by `folder_order` (nulls last), then name,
/// then creation time.
#[async_trait]
pub trait TreeTransaction: Send {
    /// Whether a record of `kind` with `id` exists.
    async fn reference_exists(&mut self, kind: ReferenceKind, id: Uuid) -> AppResult<bool>;

    /// Find a folder by ID.
    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>>;

    /// Find the first root folder of an owner.
    async fn find_root_by_owner(&mut self, owner: Owner) -> AppResult<Option<Folder>>;

    /// List direct children of a folder.
    async fn find_children(&mut self, parent_id: Uuid) -> AppResult<Vec<Folder>>;

    /// List folders matching a filter.
    async fn find_folders(&mut self, filter: &FolderFilter) -> AppResult<Vec<Folder>>;

    /// Insert the folder if its id is unknown, otherwise replace every field.
    async fn upsert_folder(&mut self, folder: &Folder) -> AppResult<Folder>;

    /// Delete a folder. Fails if it still has children or layers.
    async fn delete_folder(&mut self, id: Uuid) -> AppResult<bool>;

    /// Find a layer by ID.
    async fn find_layer(&mut self, id: Uuid) -> AppResult<Option<Layer>>;

    /// List the layers of a folder.
    async fn find_layers_by_folder(&mut self, folder_id: Uuid) -> AppResult<Vec<Layer>>;

    /// Insert the layer if its id is unknown, otherwise replace every field.
    async fn upsert_layer(&mut self, layer: &Layer) -> AppResult<Layer>;

    /// Delete a layer.
    async fn delete_layer(&mut self, id: Uuid) -> AppResult<bool>;

    /// List every folder type.
    async fn list_folder_types(&mut self) -> AppResult<Vec<FolderType>>;

    /// Make every write of this transaction visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write of this transaction.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
