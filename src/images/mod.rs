//! Image caching, storage and hydration.
//!
//! Images are keyed by [`ImageKey`](closet_core::ImageKey) and live in two
//! tiers: a bounded in-memory [`ImageCache`] in front of a durable
//! [`ImageStore`]. The [`Hydrator`] uses both to attach images to records
//! loaded from the database.

mod cache;
mod hydrate;
mod locks;
mod resolver;
mod service;
mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheLimits, CacheStats, ImageCache};
pub use hydrate::{Hydratable, Hydrator};
pub use resolver::ImageResolver;
pub use service::ImageService;
pub use storage::{DiskImageStore, ImageStore};
