//! In-memory tree store.
//!
//! A transaction holds the store lock for its whole lifetime and works on
//! a private copy of the state, so concurrent transactions are serialized
//! and an uncommitted transaction leaves no trace.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use pgeo_core::error::AppError;
use pgeo_core::result::AppResult;
use pgeo_entity::folder::{Folder, FolderType};
use pgeo_entity::layer::Layer;
use pgeo_entity::owner::Owner;

use crate::store::{FolderFilter, ReferenceKind, TreeStore, TreeTransaction};

#[derive(Debug, Clone, Default)]
struct TreeState {
    references: HashMap<ReferenceKind, HashSet<Uuid>>,
    folder_types: Vec<FolderType>,
    folders: HashMap<Uuid, Folder>,
    layers: HashMap<Uuid, Layer>,
}

impl TreeState {
    fn exists(&self, kind: ReferenceKind, id: Uuid) -> bool {
        match kind {
            ReferenceKind::Folder => self.folders.contains_key(&id),
            ReferenceKind::FolderType => self.folder_types.iter().any(|t| t.id == id),
            _ => self
                .references
                .get(&kind)
                .is_some_and(|ids| ids.contains(&id)),
        }
    }

    fn check_reference(
        &self,
        kind: ReferenceKind,
        id: Option<Uuid>,
        record: &str,
    ) -> AppResult<()> {
        match id {
            Some(id) if !self.exists(kind, id) => Err(AppError::database(format!(
                "{record} references missing {kind} '{id}'"
            ))),
            _ => Ok(()),
        }
    }

    fn sorted_folders<'a>(&self, folders: impl Iterator<Item = &'a Folder>) -> Vec<Folder> {
        let mut result: Vec<Folder> = folders.cloned().collect();
        result.sort_by(folder_ordering);
        result
    }
}

fn nulls_last(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn folder_ordering(a: &Folder, b: &Folder) -> Ordering {
    nulls_last(a.folder_order, b.folder_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

fn layer_ordering(a: &Layer, b: &Layer) -> Ordering {
    nulls_last(a.layer_order, b.layer_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Tree store that keeps everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeStore {
    state: Arc<Mutex<TreeState>>,
}

impl MemoryTreeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, group, zone or authority id.
    pub async fn register(&self, kind: ReferenceKind, id: Uuid) {
        let mut state = self.state.lock().await;
        state.references.entry(kind).or_default().insert(id);
    }

    /// Add a folder type to the taxonomy.
    pub async fn insert_folder_type(&self, folder_type: FolderType) {
        let mut state = self.state.lock().await;
        state.folder_types.retain(|t| t.id != folder_type.id);
        state.folder_types.push(folder_type);
    }

    /// Number of stored folders.
    pub async fn folder_count(&self) -> usize {
        self.state.lock().await.folders.len()
    }

    /// Number of stored layers.
    pub async fn layer_count(&self) -> usize {
        self.state.lock().await.layers.len()
    }

    /// Every stored folder in store order.
    pub async fn folders(&self) -> Vec<Folder> {
        let state = self.state.lock().await;
        state.sorted_folders(state.folders.values())
    }

    /// Every stored layer in store order.
    pub async fn layers(&self) -> Vec<Layer> {
        let state = self.state.lock().await;
        let mut layers: Vec<Layer> = state.layers.values().cloned().collect();
        layers.sort_by(layer_ordering);
        layers
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTreeTransaction { guard, working }))
    }
}

/// A snapshot transaction over a [`MemoryTreeStore`].
pub struct MemoryTreeTransaction {
    guard: OwnedMutexGuard<TreeState>,
    working: TreeState,
}

#[async_trait]
impl TreeTransaction for MemoryTreeTransaction {
    async fn reference_exists(&mut self, kind: ReferenceKind, id: Uuid) -> AppResult<bool> {
        Ok(self.working.exists(kind, id))
    }

    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.working.folders.get(&id).cloned())
    }

    async fn find_root_by_owner(&mut self, owner: Owner) -> AppResult<Option<Folder>> {
        let roots = self.working.sorted_folders(
            self.working
                .folders
                .values()
                .filter(|f| f.is_root() && f.owner() == Some(owner)),
        );
        Ok(roots.into_iter().next())
    }

    async fn find_children(&mut self, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        Ok(self.working.sorted_folders(
            self.working
                .folders
                .values()
                .filter(|f| f.parent_id == Some(parent_id)),
        ))
    }

    async fn find_folders(&mut self, filter: &FolderFilter) -> AppResult<Vec<Folder>> {
        Ok(self
            .working
            .sorted_folders(self.working.folders.values().filter(|f| filter.matches(f))))
    }

    async fn upsert_folder(&mut self, folder: &Folder) -> AppResult<Folder> {
        let state = &self.working;
        state.check_reference(ReferenceKind::User, folder.user_id, "Folder")?;
        state.check_reference(ReferenceKind::Group, folder.group_id, "Folder")?;
        state.check_reference(ReferenceKind::Folder, folder.parent_id, "Folder")?;
        state.check_reference(ReferenceKind::Zone, folder.zone_id, "Folder")?;
        state.check_reference(ReferenceKind::FolderType, folder.folder_type_id, "Folder")?;
        state.check_reference(ReferenceKind::Authority, folder.authority_id, "Folder")?;

        self.working.folders.insert(folder.id, folder.clone());
        Ok(folder.clone())
    }

    async fn delete_folder(&mut self, id: Uuid) -> AppResult<bool> {
        let has_children = self
            .working
            .folders
            .values()
            .any(|f| f.parent_id == Some(id));
        let has_layers = self.working.layers.values().any(|l| l.folder_id == id);
        if has_children || has_layers {
            return Err(AppError::database(format!(
                "Folder '{id}' is still referenced by sub-folders or layers"
            )));
        }
        Ok(self.working.folders.remove(&id).is_some())
    }

    async fn find_layer(&mut self, id: Uuid) -> AppResult<Option<Layer>> {
        Ok(self.working.layers.get(&id).cloned())
    }

    async fn find_layers_by_folder(&mut self, folder_id: Uuid) -> AppResult<Vec<Layer>> {
        let mut layers: Vec<Layer> = self
            .working
            .layers
            .values()
            .filter(|l| l.folder_id == folder_id)
            .cloned()
            .collect();
        layers.sort_by(layer_ordering);
        Ok(layers)
    }

    async fn upsert_layer(&mut self, layer: &Layer) -> AppResult<Layer> {
        let state = &self.working;
        state.check_reference(ReferenceKind::Folder, Some(layer.folder_id), "Layer")?;
        state.check_reference(ReferenceKind::User, layer.user_id, "Layer")?;
        state.check_reference(ReferenceKind::Group, layer.group_id, "Layer")?;

        self.working.layers.insert(layer.id, layer.clone());
        Ok(layer.clone())
    }

    async fn delete_layer(&mut self, id: Uuid) -> AppResult<bool> {
        Ok(self.working.layers.remove(&id).is_some())
    }

    async fn list_folder_types(&mut self) -> AppResult<Vec<FolderType>> {
        let mut types = self.working.folder_types.clone();
        types.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(types)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
