//! closet: wardrobe catalogue storage.
//!
//! Clothing items and styles are stored as headless records in SQLite while
//! their images live on disk behind a bounded in-memory cache. Reads go
//! through the repositories, which hydrate records concurrently before
//! handing them out.

pub mod context;
pub mod images;
pub mod repository;
