//! Image service coordinating the in-memory cache with durable storage.
//!
//! Repositories talk to images only through [`ImageService`]: writes land on
//! disk first and are then mirrored into the cache, deletes clear the cache
//! before touching disk, and reads go through the [`ImageResolver`].
//!
//! Every cache write or removal advances the cache generation, which makes
//! the resolver drop write-backs of disk reads that started earlier. Deletes
//! invalidate a second time once the disk is clean, so a read that raced the
//! delete cannot put the image back.

use std::sync::Arc;

use closet_core::config::HydrationPolicy;
use closet_core::{ImageData, ImageKey, ImageSlot, Result};
use tokio_util::sync::CancellationToken;

use super::cache::ImageCache;
use super::hydrate::{Hydratable, Hydrator};
use super::resolver::ImageResolver;
use super::storage::ImageStore;

/// High-level image service shared by the clothing and style repositories.
pub struct ImageService {
    store: Arc<dyn ImageStore>,
    resolver: Arc<ImageResolver>,
    hydrator: Hydrator,
}

impl ImageService {
    pub fn new(
        cache: Arc<ImageCache>,
        store: Arc<dyn ImageStore>,
        policy: HydrationPolicy,
    ) -> Self {
        let resolver = Arc::new(ImageResolver::new(cache, Arc::clone(&store)));
        let hydrator = Hydrator::new(Arc::clone(&resolver), policy);
        Self {
            store,
            resolver,
            hydrator,
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        self.resolver.cache()
    }

    pub fn store(&self) -> &Arc<dyn ImageStore> {
        &self.store
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }

    pub async fn resolve(&self, key: ImageKey) -> ImageSlot {
        self.resolver.resolve(key).await
    }

    /// Write `image` to disk, then to the cache.
    ///
    /// The cache is only populated once the disk write succeeded, so a
    /// failed persist never leaves an image that exists only in memory.
    pub async fn persist(&self, key: ImageKey, image: &ImageData) -> Result<()> {
        self.store.save(key, image).await?;
        self.cache().store(key, image.clone());
        Ok(())
    }

    /// Drop an image from the cache and the disk store.
    ///
    /// Disk failures are logged, not returned: the owning record is already
    /// gone and a stray file is harmless.
    pub async fn discard(&self, key: ImageKey) {
        self.cache().remove(&key);
        if let Err(e) = self.store.remove(key).await {
            tracing::warn!(%key, "Failed to delete image file: {e}");
        }
        self.cache().remove(&key);
    }

    /// Empty the cache and delete every image on disk.
    pub async fn discard_all(&self) -> Result<usize> {
        self.cache().remove_all();
        let removed = self.store.remove_all().await;
        self.cache().remove_all();
        removed
    }

    pub async fn hydrate<H: Hydratable>(&self, items: Vec<H>) -> Result<Vec<H::Output>> {
        self.hydrator.hydrate(items).await
    }

    pub async fn hydrate_with_cancel<H: Hydratable>(
        &self,
        items: Vec<H>,
        cancel: &CancellationToken,
    ) -> Result<Vec<H::Output>> {
        self.hydrator.hydrate_with_cancel(items, cancel).await
    }
}
