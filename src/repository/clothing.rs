use std::sync::Arc;

use closet_core::{Clothing, ClothingId, ClothingRecord, ImageData, ImageKey};
use closet_db::{Entity, EntityStore};
use tokio_util::sync::CancellationToken;

use super::error::RepositoryError;
use crate::images::ImageService;

const KIND: &str = <ClothingRecord as Entity>::KIND;

/// Clothing items: database records plus the images they own.
pub struct ClothingRepository {
    db: Arc<dyn EntityStore<ClothingRecord>>,
    images: Arc<ImageService>,
}

impl ClothingRepository {
    pub fn new(db: Arc<dyn EntityStore<ClothingRecord>>, images: Arc<ImageService>) -> Self {
        Self { db, images }
    }

    /// Load every clothing item with its image attached.
    pub async fn fetch_all(&self) -> Result<Vec<Clothing>, RepositoryError> {
        self.fetch_all_with_cancel(&CancellationToken::new()).await
    }

    pub async fn fetch_all_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Clothing>, RepositoryError> {
        let records = self
            .db
            .load_all()
            .map_err(RepositoryError::invalid_data(KIND))?;
        self.images
            .hydrate_with_cancel(records, cancel)
            .await
            .map_err(RepositoryError::invalid_data(KIND))
    }

    pub async fn fetch(&self, id: ClothingId) -> Result<Option<Clothing>, RepositoryError> {
        let Some(record) = self
            .db
            .load(id)
            .map_err(RepositoryError::invalid_data(KIND))?
        else {
            return Ok(None);
        };
        let mut hydrated = self
            .images
            .hydrate(vec![record])
            .await
            .map_err(RepositoryError::invalid_data(KIND))?;
        Ok(hydrated.pop())
    }

    /// Save the record and then its image.
    ///
    /// If the image cannot be written, a record created by this call is
    /// deleted again so no item is left pointing at an image that was never
    /// stored.
    pub async fn save(&self, clothing: &Clothing) -> Result<(), RepositoryError> {
        let image = validate_image(clothing)?;

        let existed = self
            .db
            .load(clothing.id)
            .map_err(RepositoryError::fail_to_save(KIND))?
            .is_some();
        self.db
            .save(&clothing.to_record())
            .map_err(RepositoryError::fail_to_save(KIND))?;

        if let Err(e) = self.images.persist(clothing.image_key, image).await {
            tracing::warn!(id = %clothing.id, "Image write failed after saving clothing: {e}");
            if !existed {
                match self.db.remove(clothing.id) {
                    Ok(_) => tracing::info!(id = %clothing.id, "Rolled back clothing record"),
                    Err(rollback) => {
                        tracing::error!(id = %clothing.id, "Failed to roll back clothing record: {rollback}")
                    }
                }
            }
            return Err(RepositoryError::FailToSave {
                kind: KIND,
                source: e,
            });
        }

        tracing::info!(
            id = %clothing.id,
            category = %clothing.category,
            bytes = image.size_bytes(),
            "Saved clothing"
        );
        Ok(())
    }

    /// Delete the item and its image. Returns whether a record existed.
    pub async fn remove(&self, clothing: &Clothing) -> Result<bool, RepositoryError> {
        self.remove_parts(clothing.id, clothing.image_key).await
    }

    /// Delete by id without hydrating first.
    pub async fn remove_by_id(&self, id: ClothingId) -> Result<bool, RepositoryError> {
        let Some(record) = self
            .db
            .load(id)
            .map_err(RepositoryError::fail_to_remove(KIND))?
        else {
            return Ok(false);
        };
        self.remove_parts(record.id, record.image_key).await
    }

    async fn remove_parts(&self, id: ClothingId, key: ImageKey) -> Result<bool, RepositoryError> {
        let removed = self
            .db
            .remove(id)
            .map_err(RepositoryError::fail_to_remove(KIND))?;
        self.images.discard(key).await;
        if removed {
            tracing::info!(%id, "Removed clothing");
        }
        Ok(removed)
    }

    /// Delete every item along with every stored image.
    pub async fn remove_all(&self) -> Result<usize, RepositoryError> {
        let removed = self
            .db
            .remove_all()
            .map_err(RepositoryError::fail_to_remove(KIND))?;
        if let Err(e) = self.images.discard_all().await {
            tracing::warn!("Failed to clear image store: {e}");
        }
        tracing::info!(removed, "Removed all clothing");
        Ok(removed)
    }
}

fn validate_image(clothing: &Clothing) -> Result<&ImageData, RepositoryError> {
    let invalid = || RepositoryError::InvalidImage {
        kind: KIND,
        id: clothing.id.to_string(),
    };
    let image = clothing.image.image().ok_or_else(invalid)?;
    if image.is_empty() || image::guess_format(image.as_bytes()).is_err() {
        return Err(invalid());
    }
    Ok(image)
}
