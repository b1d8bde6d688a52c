// ExternalImageRepository - the external_images side table

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::api_types::ExternalImageEntry;

/// Side-table rows mirroring parsed image references per item
pub trait ExternalImageRepository {
    /// Delete every row of `item_id` and insert `entries`, atomically.
    fn replace_for_item(&self, item_id: i64, entries: &[ExternalImageEntry]) -> Result<usize>;
    fn find_by_item(&self, item_id: i64) -> Result<Vec<ExternalImageEntry>>;
    fn delete_for_item(&self, item_id: i64) -> Result<usize>;
    fn count(&self) -> Result<usize>;
}

/// SQLite implementation of ExternalImageRepository
pub struct SqliteExternalImageRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteExternalImageRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> ExternalImageRepository for SqliteExternalImageRepository<'a> {
    fn replace_for_item(&self, item_id: i64, entries: &[ExternalImageEntry]) -> Result<usize> {
        // Dropping the transaction without commit rolls both statements back
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM external_images WHERE omeka_id = ?1", [item_id])?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO external_images
                 (omeka_id, thumbnail_uri, full_uri, linkto_uri, width, height)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for entry in entries {
                inserted += stmt.execute(params![
                    item_id,
                    entry.thumbnail_uri,
                    entry.full_uri,
                    entry.linkto_uri,
                    entry.width,
                    entry.height,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn find_by_item(&self, item_id: i64) -> Result<Vec<ExternalImageEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT external_image_id, omeka_id, thumbnail_uri, full_uri, linkto_uri, width, height
             FROM external_images WHERE omeka_id = ?1
             ORDER BY external_image_id ASC",
        )?;

        let entry_iter = stmt.query_map([item_id], |row| {
            Ok(ExternalImageEntry {
                id: Some(row.get(0)?),
                item_id: row.get(1)?,
                thumbnail_uri: row.get(2)?,
                full_uri: row.get(3)?,
                linkto_uri: row.get(4)?,
                width: row.get(5)?,
                height: row.get(6)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn delete_for_item(&self, item_id: i64) -> Result<usize> {
        let affected_rows = self
            .conn
            .execute("DELETE FROM external_images WHERE omeka_id = ?1", [item_id])?;
        Ok(affected_rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM external_images", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
