//! Cache-first image lookup with disk fallback.

use std::sync::Arc;

use closet_core::{ImageKey, ImageSlot};

use super::cache::ImageCache;
use super::storage::ImageStore;

/// Resolves an [`ImageKey`] to an [`ImageSlot`].
///
/// The cache is consulted first. On a miss the durable store is read and a
/// hit is written back into the cache before it is returned, unless the cache
/// was written or invalidated while the read was in flight. Absence and
/// I/O failures both come back as [`ImageSlot::Missing`]; the resolver never
/// fails, so one unreadable file cannot take down a whole listing.
pub struct ImageResolver {
    cache: Arc<ImageCache>,
    store: Arc<dyn ImageStore>,
}

impl ImageResolver {
    pub fn new(cache: Arc<ImageCache>, store: Arc<dyn ImageStore>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    pub async fn resolve(&self, key: ImageKey) -> ImageSlot {
        if let Some(image) = self.cache.get(&key) {
            tracing::trace!(%key, "Image cache hit");
            return ImageSlot::Loaded(image);
        }

        let generation = self.cache.generation();
        match self.store.load(key).await {
            Ok(Some(image)) => {
                tracing::trace!(%key, "Image loaded from disk");
                self.cache.store_if_current(key, image.clone(), generation);
                ImageSlot::Loaded(image)
            }
            Ok(None) => {
                tracing::warn!(%key, "Image not found in cache or on disk");
                ImageSlot::Missing
            }
            Err(e) => {
                tracing::warn!(%key, "Failed to load image, treating as missing: {e}");
                ImageSlot::Missing
            }
        }
    }
}
