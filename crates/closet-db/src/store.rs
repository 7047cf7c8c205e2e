//! The database collaborator consumed by the repository façade.
//!
//! [`EntityStore`] is the narrow load/save/remove/remove-all interface the
//! repositories depend on. [`SqliteStore`] implements it for both record
//! kinds on top of the pooled query modules; tests substitute their own
//! implementations to simulate database failures.

use std::fmt;

use closet_core::{ClothingId, ClothingRecord, Result, StyleId, StyleRecord};

use crate::pool::{get_conn, DbPool};
use crate::queries::{clothing, styles};

/// A persisted record kind.
pub trait Entity: Send + Sync + 'static {
    type Id: Copy + fmt::Display + Send + Sync + 'static;

    /// Human-readable kind, used in logs and not-found errors.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
}

impl Entity for ClothingRecord {
    type Id = ClothingId;
    const KIND: &'static str = "clothing";

    fn id(&self) -> ClothingId {
        self.id
    }
}

impl Entity for StyleRecord {
    type Id = StyleId;
    const KIND: &'static str = "style";

    fn id(&self) -> StyleId {
        self.id
    }
}

/// Storage for one entity kind. Records never carry image bytes.
pub trait EntityStore<E: Entity>: Send + Sync {
    fn load_all(&self) -> Result<Vec<E>>;

    fn load(&self, id: E::Id) -> Result<Option<E>>;

    /// Insert or update by primary key.
    fn save(&self, entity: &E) -> Result<()>;

    /// Returns whether a record was actually removed.
    fn remove(&self, id: E::Id) -> Result<bool>;

    /// Returns how many records were removed.
    fn remove_all(&self) -> Result<usize>;
}

/// SQLite-backed [`EntityStore`] for clothing and styles.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl EntityStore<ClothingRecord> for SqliteStore {
    fn load_all(&self) -> Result<Vec<ClothingRecord>> {
        clothing::list_clothing(&*get_conn(&self.pool)?)
    }

    fn load(&self, id: ClothingId) -> Result<Option<ClothingRecord>> {
        clothing::get_clothing(&*get_conn(&self.pool)?, id)
    }

    fn save(&self, entity: &ClothingRecord) -> Result<()> {
        clothing::upsert_clothing(&*get_conn(&self.pool)?, entity)
    }

    fn remove(&self, id: ClothingId) -> Result<bool> {
        clothing::delete_clothing(&*get_conn(&self.pool)?, id)
    }

    fn remove_all(&self) -> Result<usize> {
        clothing::delete_all_clothing(&*get_conn(&self.pool)?)
    }
}

impl EntityStore<StyleRecord> for SqliteStore {
    fn load_all(&self) -> Result<Vec<StyleRecord>> {
        styles::list_styles(&*get_conn(&self.pool)?)
    }

    fn load(&self, id: StyleId) -> Result<Option<StyleRecord>> {
        styles::get_style(&*get_conn(&self.pool)?, id)
    }

    fn save(&self, entity: &StyleRecord) -> Result<()> {
        styles::upsert_style(&*get_conn(&self.pool)?, entity)
    }

    fn remove(&self, id: StyleId) -> Result<bool> {
        styles::delete_style(&*get_conn(&self.pool)?, id)
    }

    fn remove_all(&self) -> Result<usize> {
        styles::delete_all_styles(&*get_conn(&self.pool)?)
    }
}
