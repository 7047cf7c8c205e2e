//! Row mapping between SQLite tables and the headless domain records.
//!
//! Domain types live in `closet-core`, so mapping goes through the local
//! [`FromRow`] trait rather than inherent constructors.

use chrono::{DateTime, Utc};
use closet_core::{Category, ClothingRecord};
use rusqlite::types::Type;
use uuid::Uuid;

/// Column list for `clothing`, in the order [`ClothingRecord::from_row`] expects.
pub const CLOTHING_COLS: &str = "id, image_key, category, name, created_at";

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
pub fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e))?;
    Ok(T::from(uuid))
}

/// Parse a [`Category`] from its lowercase text form.
pub fn parse_category(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Category> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_err(idx, e))
}

/// Parse an RFC 3339 timestamp column.
pub fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

/// Format a timestamp the way [`parse_timestamp`] reads it back.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

// ---------------------------------------------------------------------------
// FromRow
// ---------------------------------------------------------------------------

/// Construct a value from a row, starting at column `offset`.
pub trait FromRow: Sized {
    fn from_row_at(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Self>;

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }
}

impl FromRow for ClothingRecord {
    fn from_row_at(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, offset)?,
            image_key: parse_id(row, offset + 1)?,
            category: parse_category(row, offset + 2)?,
            name: row.get(offset + 3)?,
            created_at: parse_timestamp(row, offset + 4)?,
        })
    }
}
