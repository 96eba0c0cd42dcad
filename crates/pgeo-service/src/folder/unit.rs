//! Unit of work for tree mutations.
//!
//! A unit owns the store transaction of one public operation. Every write
//! goes through it so it can record which owners' trees changed; after a
//! successful commit those owners' cached roots are invalidated.

use std::collections::HashSet;

use tracing::{debug, warn};
use uuid::Uuid;

use pgeo_cache::RootFolderCache;
use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_database::{ReferenceKind, TreeStore, TreeTransaction};
use pgeo_entity::folder::Folder;
use pgeo_entity::layer::Layer;
use pgeo_entity::owner::Owner;

pub(crate) struct TreeUnitOfWork {
    tx: Box<dyn TreeTransaction>,
    cache: RootFolderCache,
    operation: &'static str,
    cascading: bool,
    touched: HashSet<Owner>,
    walked: HashSet<Uuid>,
    writes: usize,
    current: Option<Uuid>,
}

impl TreeUnitOfWork {
    /// Open a unit for a single-record operation. Errors propagate unchanged.
    pub(crate) async fn begin(
        store: &dyn TreeStore,
        cache: &RootFolderCache,
        operation: &'static str,
    ) -> AppResult<Self> {
        Ok(Self {
            tx: store.begin().await?,
            cache: cache.clone(),
            operation,
            cascading: false,
            touched: HashSet::new(),
            walked: HashSet::new(),
            writes: 0,
            current: None,
        })
    }

    /// Open a unit for a recursive operation. An error after the first
    /// write is reported as a cascade failure.
    pub(crate) async fn begin_cascade(
        store: &dyn TreeStore,
        cache: &RootFolderCache,
        operation: &'static str,
    ) -> AppResult<Self> {
        let mut unit = Self::begin(store, cache, operation).await?;
        unit.cascading = true;
        Ok(unit)
    }

    /// The underlying transaction, for reads.
    pub(crate) fn tx(&mut self) -> &mut dyn TreeTransaction {
        self.tx.as_mut()
    }

    /// Fail with `ReferenceNotFound` unless a record of `kind` with `id` exists.
    pub(crate) async fn require(&mut self, kind: ReferenceKind, id: Uuid) -> AppResult<()> {
        if self.tx.reference_exists(kind, id).await? {
            Ok(())
        } else {
            Err(AppError::reference_not_found(kind, id))
        }
    }

    /// Record the folder currently being processed.
    pub(crate) fn enter(&mut self, folder_id: Uuid) {
        self.current = Some(folder_id);
    }

    /// Mark the tree containing `folder` as changed.
    pub(crate) async fn touch_folder(&mut self, folder: &Folder) -> AppResult<()> {
        if let Some(owner) = folder.owner() {
            self.touched.insert(owner);
        }
        let mut next = folder.parent_id;
        while let Some(id) = next {
            if !self.walked.insert(id) {
                break;
            }
            let Some(parent) = self.tx.find_folder(id).await? else {
                break;
            };
            if let Some(owner) = parent.owner() {
                self.touched.insert(owner);
            }
            next = parent.parent_id;
        }
        Ok(())
    }

    pub(crate) async fn touch_layer(&mut self, layer: &Layer) -> AppResult<()> {
        if let Some(owner) = layer.owner() {
            self.touched.insert(owner);
        }
        if let Some(folder) = self.tx.find_folder(layer.folder_id).await? {
            self.touch_folder(&folder).await?;
        }
        Ok(())
    }

    pub(crate) async fn upsert_folder(&mut self, folder: &Folder) -> AppResult<Folder> {
        self.touch_folder(folder).await?;
        let saved = self.tx.upsert_folder(folder).await?;
        self.writes += 1;
        Ok(saved)
    }

    pub(crate) async fn delete_folder(&mut self, folder: &Folder) -> AppResult<bool> {
        self.touch_folder(folder).await?;
        let deleted = self.tx.delete_folder(folder.id).await?;
        self.writes += 1;
        Ok(deleted)
    }

    pub(crate) async fn upsert_layer(&mut self, layer: &Layer) -> AppResult<Layer> {
        let saved = self.tx.upsert_layer(layer).await?;
        self.touch_layer(&saved).await?;
        self.writes += 1;
        Ok(saved)
    }

    pub(crate) async fn delete_layer(&mut self, layer: &Layer) -> AppResult<bool> {
        self.touch_layer(layer).await?;
        let deleted = self.tx.delete_layer(layer.id).await?;
        self.writes += 1;
        Ok(deleted)
    }

    /// Commit on success, roll back on error.
    pub(crate) async fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn commit(self) -> AppResult<()> {
        let Self {
            tx,
            cache,
            operation,
            touched,
            writes,
            ..
        } = self;

        tx.commit().await?;
        debug!(operation, writes, owners = touched.len(), "Tree changes committed");
        // The change is durable from here on; a cache outage must not turn
        // it into a reported failure.
        invalidate(&cache, operation, touched).await;
        Ok(())
    }

    async fn abort(self, err: AppError) -> AppError {
        if let Err(rollback_err) = self.tx.rollback().await {
            warn!(operation = self.operation, error = %rollback_err, "Rollback failed");
        }
        // An exhausted round budget is reported as is.
        if !self.cascading || self.writes == 0 || err.is(ErrorKind::Conflict) {
            return err;
        }

        let at = self
            .current
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        warn!(
            operation = self.operation,
            folder_id = %at,
            writes = self.writes,
            error = %err,
            "Recursive tree operation failed, rolled back"
        );
        AppError::cascade_failure(
            format!(
                "{} failed at folder {at}; {} writes rolled back",
                self.operation, self.writes
            ),
            err,
        )
    }
}

/// Drop the cached roots of `owners`. If a single invalidation fails the
/// whole root cache is flushed instead.
async fn invalidate(cache: &RootFolderCache, operation: &'static str, owners: HashSet<Owner>) {
    for owner in owners {
        if let Err(e) = cache.invalidate(owner).await {
            warn!(%owner, error = %e, "Root cache invalidation failed, flushing");
            if let Err(e) = cache.flush_all().await {
                warn!(
                    operation,
                    error = %e,
                    "Root cache flush failed after commit, cached roots may be stale"
                );
            }
            return;
        }
    }
}
