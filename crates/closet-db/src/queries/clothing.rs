//! Clothing CRUD operations.

use closet_core::{ClothingId, ClothingRecord, Error, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{format_timestamp, FromRow, CLOTHING_COLS};

/// Insert a clothing record, or update it in place if the id already exists.
pub fn upsert_clothing(conn: &Connection, record: &ClothingRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO clothing (id, image_key, category, name, created_at)
         VALUES (?1,?2,?3,?4,?5)
         ON CONFLICT(id) DO UPDATE SET
            image_key = excluded.image_key,
            category  = excluded.category,
            name      = excluded.name",
        rusqlite::params![
            record.id.to_string(),
            record.image_key.to_string(),
            record.category.as_str(),
            record.name,
            format_timestamp(&record.created_at),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get a clothing record by id.
pub fn get_clothing(conn: &Connection, id: ClothingId) -> Result<Option<ClothingRecord>> {
    let q = format!("SELECT {CLOTHING_COLS} FROM clothing WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], ClothingRecord::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List every clothing record, oldest first.
pub fn list_clothing(conn: &Connection) -> Result<Vec<ClothingRecord>> {
    let q = format!("SELECT {CLOTHING_COLS} FROM clothing ORDER BY created_at, id");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], ClothingRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete a clothing record by id. Style slots holding it cascade away.
pub fn delete_clothing(conn: &Connection, id: ClothingId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM clothing WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete every clothing record, returning how many were removed.
pub fn delete_all_clothing(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM clothing", [])
        .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use closet_core::{Category, Clothing, ImageData};

    fn record(category: Category, name: &str) -> ClothingRecord {
        Clothing::new(category, name, ImageData::from(&b"img"[..])).to_record()
    }

    #[test]
    fn upsert_get_list_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let shirt = record(Category::Top, "oxford shirt");
        let jeans = record(Category::Bottom, "jeans");
        upsert_clothing(&conn, &shirt).unwrap();
        upsert_clothing(&conn, &jeans).unwrap();

        assert_eq!(get_clothing(&conn, shirt.id).unwrap(), Some(shirt.clone()));
        assert_eq!(list_clothing(&conn).unwrap().len(), 2);

        assert!(delete_clothing(&conn, shirt.id).unwrap());
        assert!(!delete_clothing(&conn, shirt.id).unwrap());
        assert_eq!(get_clothing(&conn, shirt.id).unwrap(), None);
    }

    #[test]
    fn upsert_updates_existing_row() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut coat = record(Category::Outer, "coat");
        upsert_clothing(&conn, &coat).unwrap();
        coat.name = "wool coat".into();
        upsert_clothing(&conn, &coat).unwrap();

        let all = list_clothing(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "wool coat");
    }

    #[test]
    fn delete_all_reports_count() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        for i in 0..3 {
            upsert_clothing(&conn, &record(Category::Accessory, &format!("ring {i}"))).unwrap();
        }
        assert_eq!(delete_all_clothing(&conn).unwrap(), 3);
        assert!(list_clothing(&conn).unwrap().is_empty());
    }
}
