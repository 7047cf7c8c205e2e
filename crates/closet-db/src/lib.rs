//! closet-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, row mapping, per-table query modules, and the
//! [`EntityStore`](store::EntityStore) collaborator the repositories consume.
//! Image bytes never pass through this crate; records only carry image keys.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use store::{Entity, EntityStore, SqliteStore};
