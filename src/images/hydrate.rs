//! Concurrent fan-out / fan-in hydration of headless records.
//!
//! Every record in a batch is hydrated in its own task; within a task all of
//! the record's image keys resolve concurrently. The batch finishes only once
//! every task has joined, and results are reassembled in input order.
//!
//! What happens when an image cannot be resolved is governed by
//! [`HydrationPolicy`]: `BestEffort` marks that slot [`ImageSlot::Missing`]
//! and carries on, `Strict` aborts the remaining tasks and fails the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use closet_core::config::HydrationPolicy;
use closet_core::{
    Clothing, ClothingRecord, Error, ImageKey, ImageSlot, Result, Style, StyleRecord,
};
use futures::future::join_all;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::resolver::ImageResolver;

/// A headless record that can have its images attached.
pub trait Hydratable: Send + 'static {
    type Output: Send + 'static;

    /// Short description for logs and errors, e.g. `clothing <id>`.
    fn label(&self) -> String;

    fn image_keys(&self) -> Vec<ImageKey>;

    /// Build the hydrated form. Keys absent from `images` become `Missing`.
    fn attach(self, images: &HashMap<ImageKey, ImageSlot>) -> Self::Output;
}

fn slot_for(images: &HashMap<ImageKey, ImageSlot>, key: &ImageKey) -> ImageSlot {
    images.get(key).cloned().unwrap_or(ImageSlot::Missing)
}

impl Hydratable for ClothingRecord {
    type Output = Clothing;

    fn label(&self) -> String {
        format!("clothing {}", self.id)
    }

    fn image_keys(&self) -> Vec<ImageKey> {
        vec![self.image_key]
    }

    fn attach(self, images: &HashMap<ImageKey, ImageSlot>) -> Clothing {
        let image = slot_for(images, &self.image_key);
        Clothing::from_record(self, image)
    }
}

impl Hydratable for StyleRecord {
    type Output = Style;

    fn label(&self) -> String {
        format!("style {}", self.id)
    }

    fn image_keys(&self) -> Vec<ImageKey> {
        StyleRecord::image_keys(self)
    }

    fn attach(self, images: &HashMap<ImageKey, ImageSlot>) -> Style {
        let clothing = self.slots.into_values().map(|record| {
            let image = slot_for(images, &record.image_key);
            Clothing::from_record(record, image)
        });
        Style::restore(self.id, self.name, self.created_at, clothing)
    }
}

/// Result of hydrating one record.
struct Hydrated<T> {
    index: usize,
    label: String,
    output: T,
    missing: Vec<ImageKey>,
}

async fn hydrate_one<H: Hydratable>(
    resolver: &ImageResolver,
    index: usize,
    item: H,
) -> Hydrated<H::Output> {
    let keys = item.image_keys();
    let slots = join_all(keys.iter().map(|key| resolver.resolve(*key))).await;
    let images: HashMap<ImageKey, ImageSlot> = keys.into_iter().zip(slots).collect();
    let missing = images
        .iter()
        .filter(|(_, slot)| !slot.is_loaded())
        .map(|(key, _)| *key)
        .collect();

    Hydrated {
        index,
        label: item.label(),
        output: item.attach(&images),
        missing,
    }
}

/// Attaches images to batches of headless records.
#[derive(Clone)]
pub struct Hydrator {
    resolver: Arc<ImageResolver>,
    policy: HydrationPolicy,
}

impl Hydrator {
    pub fn new(resolver: Arc<ImageResolver>, policy: HydrationPolicy) -> Self {
        Self { resolver, policy }
    }

    pub fn policy(&self) -> HydrationPolicy {
        self.policy
    }

    /// Hydrate a batch with no external cancellation.
    pub async fn hydrate<H: Hydratable>(&self, items: Vec<H>) -> Result<Vec<H::Output>> {
        self.hydrate_with_cancel(items, &CancellationToken::new())
            .await
    }

    /// Hydrate a batch, giving up with [`Error::Cancelled`] if `cancel` fires
    /// before every record has joined.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] when the token is cancelled first.
    /// - [`Error::Hydration`] when a task panics, or under
    ///   [`HydrationPolicy::Strict`] when any image is missing.
    pub async fn hydrate_with_cancel<H: Hydratable>(
        &self,
        items: Vec<H>,
        cancel: &CancellationToken,
    ) -> Result<Vec<H::Output>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            tasks.spawn(async move { hydrate_one(&resolver, index, item).await });
        }

        let mut results: Vec<Option<H::Output>> = (0..total).map(|_| None).collect();
        let mut missing_images = 0usize;

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    tracing::debug!(items = total, "Hydration cancelled");
                    return Err(Error::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            let hydrated = match joined {
                Ok(hydrated) => hydrated,
                Err(e) => {
                    tasks.abort_all();
                    return Err(Error::Hydration(format!("hydration task failed: {e}")));
                }
            };

            if !hydrated.missing.is_empty() {
                missing_images += hydrated.missing.len();
                match self.policy {
                    HydrationPolicy::Strict => {
                        tasks.abort_all();
                        return Err(Error::Hydration(format!(
                            "{} is missing {} image(s)",
                            hydrated.label,
                            hydrated.missing.len()
                        )));
                    }
                    HydrationPolicy::BestEffort => {
                        tracing::warn!(
                            missing = ?hydrated.missing,
                            "{} hydrated with missing image(s)",
                            hydrated.label
                        );
                    }
                }
            }

            results[hydrated.index] = Some(hydrated.output);
        }

        tracing::debug!(
            items = total,
            missing_images,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Hydrated batch"
        );

        results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::Internal("hydration finished with unfilled results".into()))
    }
}
