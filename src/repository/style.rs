use std::sync::Arc;

use closet_core::{Style, StyleId, StyleRecord};
use closet_db::{Entity, EntityStore};
use tokio_util::sync::CancellationToken;

use super::error::RepositoryError;
use crate::images::ImageService;

const KIND: &str = <StyleRecord as Entity>::KIND;

/// Styles reference clothing images but never own them: saving and removing
/// a style only ever touches the style's own record.
pub struct StyleRepository {
    db: Arc<dyn EntityStore<StyleRecord>>,
    images: Arc<ImageService>,
}

impl StyleRepository {
    pub fn new(db: Arc<dyn EntityStore<StyleRecord>>, images: Arc<ImageService>) -> Self {
        Self { db, images }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Style>, RepositoryError> {
        self.fetch_all_with_cancel(&CancellationToken::new()).await
    }

    pub async fn fetch_all_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Style>, RepositoryError> {
        let records = self
            .db
            .load_all()
            .map_err(RepositoryError::invalid_data(KIND))?;
        self.images
            .hydrate_with_cancel(records, cancel)
            .await
            .map_err(RepositoryError::invalid_data(KIND))
    }

    pub async fn fetch(&self, id: StyleId) -> Result<Option<Style>, RepositoryError> {
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

    /// Save the style record. Every slot must hold a loaded image.
    pub async fn save(&self, style: &Style) -> Result<(), RepositoryError> {
        let missing = style.missing_slots();
        if !missing.is_empty() {
            tracing::debug!(id = %style.id, ?missing, "Refusing to save style with missing images");
            return Err(RepositoryError::InvalidImage {
                kind: KIND,
                id: style.id.to_string(),
            });
        }

        self.db
            .save(&style.to_record())
            .map_err(RepositoryError::fail_to_save(KIND))?;
        tracing::info!(id = %style.id, slots = style.slots().len(), "Saved style");
        Ok(())
    }

    pub async fn remove(&self, style: &Style) -> Result<bool, RepositoryError> {
        self.remove_by_id(style.id).await
    }

    pub async fn remove_by_id(&self, id: StyleId) -> Result<bool, RepositoryError> {
        let removed = self
            .db
            .remove(id)
            .map_err(RepositoryError::fail_to_remove(KIND))?;
        if removed {
            tracing::info!(%id, "Removed style");
        }
        Ok(removed)
    }

    pub async fn remove_all(&self) -> Result<usize, RepositoryError> {
        let removed = self
            .db
            .remove_all()
            .map_err(RepositoryError::fail_to_remove(KIND))?;
        tracing::info!(removed, "Removed all styles");
        Ok(removed)
    }
}
