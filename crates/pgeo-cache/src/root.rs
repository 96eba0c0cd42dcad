//! Cache of materialized root folders, keyed by owner.
//!
//! Every owner has a generation counter. A reader takes a [`ReadTicket`]
//! before it reads the store and may only populate the cache if no
//! invalidation of that owner happened in between, so a slow reader can
//! never put a tree back that a concurrent writer already replaced.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use pgeo_core::result::AppResult;
use pgeo_core::traits::cache::CacheProvider;
use pgeo_entity::folder::FolderView;
use pgeo_entity::owner::Owner;

use crate::keys;
use crate::provider::CacheManager;

/// Proof of the cache generation observed before a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket {
    owner: Owner,
    epoch: u64,
    generation: u64,
}

impl ReadTicket {
    /// The owner this ticket was taken for.
    pub fn owner(&self) -> Owner {
        self.owner
    }
}

/// Root folder cache with generation-guarded population.
#[derive(Debug, Clone)]
pub struct RootFolderCache {
    cache: CacheManager,
    generations: Arc<DashMap<Owner, u64>>,
    epoch: Arc<AtomicU64>,
}

impl RootFolderCache {
    /// Create a root folder cache over a cache manager.
    pub fn new(cache: CacheManager) -> Self {
        Self {
            cache,
            generations: Arc::new(DashMap::new()),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Look up the cached root folder of an owner.
    pub async fn get(&self, owner: Owner) -> AppResult<Option<FolderView>> {
        self.cache.get_json(&keys::root_folder(owner)).await
    }

    /// Take a ticket before reading the store for `owner`.
    pub fn ticket(&self, owner: Owner) -> ReadTicket {
        ReadTicket {
            owner,
            epoch: self.epoch.load(Ordering::SeqCst),
            generation: self.generation(owner),
        }
    }

    /// Cache `view` unless the owner was invalidated since `ticket` was taken.
    ///
    /// Returns whether the entry was kept.
    pub async fn put_if_current(&self, ticket: ReadTicket, view: &FolderView) -> AppResult<bool> {
        if !self.is_current(&ticket) {
            debug!(owner = %ticket.owner, "Skipping stale root folder population");
            return Ok(false);
        }

        let key = keys::root_folder(ticket.owner);
        self.cache.set_json(&key, view).await?;

        // An invalidation may have run between the check and the write.
        if !self.is_current(&ticket) {
            self.cache.delete(&key).await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Drop the cached root folder of an owner.
    pub async fn invalidate(&self, owner: Owner) -> AppResult<()> {
        *self.generations.entry(owner).or_insert(0) += 1;
        self.cache.delete(&keys::root_folder(owner)).await?;
        debug!(%owner, "Invalidated root folder cache");
        Ok(())
    }

    /// Drop every cached root folder.
    ///
    /// Also forgets every per-owner generation: tickets taken before the
    /// flush are already stale through the epoch.
    pub async fn flush_all(&self) -> AppResult<()> {
        // Clear before bumping, so a ticket taken in between carries the old
        // epoch and a reset counter can never match it again.
        self.generations.clear();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let removed = self
            .cache
            .delete_pattern(&keys::root_folder_pattern())
            .await?;
        warn!(removed, "Flushed every cached root folder");
        Ok(())
    }

    /// Number of owners with a tracked generation.
    pub fn tracked_owners(&self) -> usize {
        self.generations.len()
    }

    fn generation(&self, owner: Owner) -> u64 {
        self.generations.get(&owner).map(|g| *g).unwrap_or(0)
    }

    fn is_current(&self, ticket: &ReadTicket) -> bool {
        ticket.epoch == self.epoch.load(Ordering::SeqCst)
            && ticket.generation == self.generation(ticket.owner)
    }
}
