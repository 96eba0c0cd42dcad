//! # persistence-geo
//!
//! Per-owner folder and layer trees, kept in sync with a GeoServer
//! catalog. This crate wires the workspace crates together:
//!
//! - [`Platform::connect`] builds every service from an [`AppConfig`]
//!   against PostgreSQL, the configured cache and GeoServer.
//! - [`Platform::from_parts`] builds them over caller-supplied seams, for
//!   embedding and tests.
//! - [`init_tracing`] installs the `tracing` subscriber described by the
//!   logging section.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use pgeo_cache::{CacheManager, RootFolderCache};
use pgeo_catalog::{CatalogAdapter, GeoServerClient, PostgisTableStore, SpatialTableStore};
use pgeo_core::config::{AppConfig, LoggingConfig};
use pgeo_core::result::AppResult;
use pgeo_core::traits::cache::CacheProvider;
use pgeo_database::migration::run_migrations;
use pgeo_database::{DatabasePool, PgTreeStore, TreeStore};
use pgeo_service::{CatalogSyncEngine, FolderService, LayerService, PublicationService};

pub use pgeo_core::{AppError, ErrorKind};

/// Every service of the system, sharing one store, cache and catalog.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Folder tree engine.
    pub folders: FolderService,
    /// Layer bookkeeping.
    pub layers: LayerService,
    /// Catalog sequences.
    pub sync: CatalogSyncEngine,
    /// Layer publication bookkeeping.
    pub publications: PublicationService,
    /// Root folder cache.
    pub root_cache: RootFolderCache,
    cache: CacheManager,
    adapter: Arc<dyn CatalogAdapter>,
    database: Option<DatabasePool>,
}

/// Reachability of the platform's backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    /// PostgreSQL answers; `None` when no database is attached.
    pub database: Option<bool>,
    /// The cache backend answers.
    pub cache: bool,
    /// The catalog answers.
    pub catalog: bool,
}

impl Platform {
    /// Connect to PostgreSQL, run migrations and build every service
    /// over the configured cache and GeoServer instance.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        info!("Starting persistence-geo v{}", env!("CARGO_PKG_VERSION"));

        let database = DatabasePool::connect(&config.database).await?;
        run_migrations(database.pool()).await?;

        info!(provider = %config.cache.provider, "Initializing cache");
        let cache = CacheManager::new(&config.cache).await?;

        let adapter = Arc::new(GeoServerClient::new(&config.catalog)?);
        let tables = Arc::new(PostgisTableStore::new(database.pool().clone()));
        let store = Arc::new(PgTreeStore::new(database.pool().clone()));

        let mut platform = Self::from_parts(config, store, cache, adapter, tables);
        platform.database = Some(database);
        info!("persistence-geo ready");
        Ok(platform)
    }

    /// Build every service over the given store, cache and catalog seams.
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn TreeStore>,
        cache: CacheManager,
        adapter: Arc<dyn CatalogAdapter>,
        tables: Arc<dyn SpatialTableStore>,
    ) -> Self {
        let root_cache = RootFolderCache::new(cache.clone());
        let folders = FolderService::new(
            Arc::clone(&store),
            root_cache.clone(),
            config.tree.clone(),
        );
        let layers = LayerService::new(Arc::clone(&store), root_cache.clone());
        let sync = CatalogSyncEngine::new(Arc::clone(&adapter), tables, config.catalog.clone());
        let publications = PublicationService::new(store, root_cache.clone(), sync.clone());

        Self {
            config,
            folders,
            layers,
            sync,
            publications,
            root_cache,
            cache,
            adapter,
            database: None,
        }
    }

    /// Check every backend. Failures are reported as `false`, never as
    /// an error.
    pub async fn health_check(&self) -> HealthReport {
        let database = match &self.database {
            Some(db) => Some(db.health_check().await.unwrap_or(false)),
            None => None,
        };
        HealthReport {
            database,
            cache: self.cache.health_check().await.unwrap_or(false),
            catalog: self.adapter.health_check().await.unwrap_or(false),
        }
    }

    /// Close the database pool, if any.
    pub async fn shutdown(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
        info!("persistence-geo stopped");
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling it twice is a
/// no-op.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let _ = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
}
