//! Style CRUD operations.
//!
//! A style row owns its slots; saving a style rewrites the slot set inside a
//! transaction so the stored mapping always matches the record exactly.

use std::collections::{BTreeMap, HashMap};

use closet_core::{Category, ClothingRecord, Error, Result, StyleId, StyleRecord};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{format_timestamp, parse_category, parse_id, parse_timestamp, FromRow};

const SLOT_QUERY: &str = "SELECT s.style_id, s.category,
        c.id, c.image_key, c.category, c.name, c.created_at
     FROM style_slots s
     JOIN clothing c ON c.id = s.clothing_id";

/// Insert or replace a style together with its slots.
pub fn upsert_style(conn: &Connection, record: &StyleRecord) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "INSERT INTO styles (id, name, created_at) VALUES (?1,?2,?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        rusqlite::params![
            record.id.to_string(),
            record.name,
            format_timestamp(&record.created_at),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM style_slots WHERE style_id = ?1",
        [record.id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for (category, clothing) in &record.slots {
        tx.execute(
            "INSERT INTO style_slots (style_id, category, clothing_id) VALUES (?1,?2,?3)",
            rusqlite::params![
                record.id.to_string(),
                category.as_str(),
                clothing.id.to_string(),
            ],
        )
        .map_err(|e| Error::database(format!("slot {category}: {e}")))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))
}

/// Load the slots of one style.
fn slots_for(conn: &Connection, id: StyleId) -> Result<BTreeMap<Category, ClothingRecord>> {
    let q = format!("{SLOT_QUERY} WHERE s.style_id = ?1");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let slots = stmt
        .query_map([id.to_string()], |row| {
            Ok((parse_category(row, 1)?, ClothingRecord::from_row_at(row, 2)?))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(slots)
}

/// Get a style and its slots by id.
pub fn get_style(conn: &Connection, id: StyleId) -> Result<Option<StyleRecord>> {
    let header = conn
        .query_row(
            "SELECT name, created_at FROM styles WHERE id = ?1",
            [id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, parse_timestamp(row, 1)?)),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;

    let Some((name, created_at)) = header else {
        return Ok(None);
    };

    Ok(Some(StyleRecord {
        id,
        name,
        slots: slots_for(conn, id)?,
        created_at,
    }))
}

/// List every style with its slots, oldest first.
pub fn list_styles(conn: &Connection) -> Result<Vec<StyleRecord>> {
    let mut slots: HashMap<StyleId, BTreeMap<Category, ClothingRecord>> = HashMap::new();
    {
        let mut stmt = conn
            .prepare(SLOT_QUERY)
            .map_err(|e| Error::database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    parse_id::<StyleId>(row, 0)?,
                    parse_category(row, 1)?,
                    ClothingRecord::from_row_at(row, 2)?,
                ))
            })
            .map_err(|e| Error::database(e.to_string()))?;
        for row in rows {
            let (style_id, category, clothing) =
                row.map_err(|e| Error::database(e.to_string()))?;
            slots.entry(style_id).or_default().insert(category, clothing);
        }
    }

    let mut stmt = conn
        .prepare("SELECT id, name, created_at FROM styles ORDER BY created_at, id")
        .map_err(|e| Error::database(e.to_string()))?;
    let styles = stmt
        .query_map([], |row| {
            Ok((
                parse_id::<StyleId>(row, 0)?,
                row.get::<_, String>(1)?,
                parse_timestamp(row, 2)?,
            ))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .map(|row| {
            row.map(|(id, name, created_at)| StyleRecord {
                id,
                name,
                slots: slots.remove(&id).unwrap_or_default(),
                created_at,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(styles)
}

/// Delete a style by id.
pub fn delete_style(conn: &Connection, id: StyleId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM styles WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete every style, returning how many were removed.
pub fn delete_all_styles(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM styles", [])
        .map_err(|e| Error::database(e.to_string()))
}
