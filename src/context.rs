//! Wiring for the long-lived application components.

use std::sync::Arc;

use closet_core::config::Config;
use closet_core::Result;
use closet_db::pool::{init_pool, DbPool};
use closet_db::SqliteStore;

use crate::images::{CacheLimits, DiskImageStore, ImageCache, ImageService};
use crate::repository::{ClothingRepository, StyleRepository};

/// Everything a front end needs: the database pool, the shared image layer
/// and one repository per entity kind.
pub struct AppContext {
    pub pool: DbPool,
    pub images: Arc<ImageService>,
    pub clothing: ClothingRepository,
    pub styles: StyleRepository,
}

impl AppContext {
    /// Open the database at `config.database.path` and build the image
    /// layer on top of `config.images.storage_dir`.
    pub fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool = init_pool(&config.database)?;
        Ok(Self::with_pool(config, pool))
    }

    /// Build a context around an existing pool (e.g. an in-memory one).
    pub fn with_pool(config: &Config, pool: DbPool) -> Self {
        let cache = Arc::new(ImageCache::new(CacheLimits::from(config.cache)));
        let store = Arc::new(DiskImageStore::new(config.images.storage_dir.clone()));
        let images = Arc::new(ImageService::new(cache, store, config.hydration.policy));

        let db = Arc::new(SqliteStore::new(pool.clone()));
        let clothing = ClothingRepository::new(db.clone(), Arc::clone(&images));
        let styles = StyleRepository::new(db, Arc::clone(&images));

        tracing::debug!(
            storage_dir = %config.images.storage_dir.display(),
            max_count = config.cache.max_count,
            max_total_bytes = config.cache.max_total_bytes,
            policy = ?config.hydration.policy,
            "Application context ready"
        );

        Self {
            pool,
            images,
            clothing,
            styles,
        }
    }
}
