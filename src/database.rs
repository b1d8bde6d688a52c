use rusqlite::{Connection, Result};
use std::path::Path;

use crate::config::database::{ELEMENT_TEXTS_TABLE, EXTERNAL_IMAGES_TABLE, OPTIONS_TABLE};

/// SQLite database standing in for the host's storage.
///
/// The host owns `options` and `element_texts`; the plugin owns
/// `external_images`, created on install and dropped on uninstall.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let db = Database { conn };
        db.initialize_host_schema()?;
        Ok(db)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn initialize_host_schema(&self) -> Result<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {OPTIONS_TABLE} (
                    name TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                )"
            ),
            [],
        )?;

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {ELEMENT_TEXTS_TABLE} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    record_type TEXT NOT NULL,
                    record_id INTEGER NOT NULL,
                    element_set TEXT NOT NULL,
                    element_name TEXT NOT NULL,
                    text TEXT NOT NULL
                )"
            ),
            [],
        )?;

        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{ELEMENT_TEXTS_TABLE}_record
                 ON {ELEMENT_TEXTS_TABLE} (record_type, record_id)"
            ),
            [],
        )?;

        Ok(())
    }

    /// Create the plugin side table
    pub fn create_plugin_schema(&self) -> Result<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {EXTERNAL_IMAGES_TABLE} (
                    external_image_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    omeka_id INTEGER NOT NULL,
                    thumbnail_uri TEXT NOT NULL DEFAULT '',
                    full_uri TEXT NOT NULL DEFAULT '',
                    linkto_uri TEXT NOT NULL DEFAULT '',
                    width INTEGER NOT NULL DEFAULT 0 CHECK (width >= 0),
                    height INTEGER NOT NULL DEFAULT 0 CHECK (height >= 0)
                )"
            ),
            [],
        )?;

        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{EXTERNAL_IMAGES_TABLE}_omeka_id
                 ON {EXTERNAL_IMAGES_TABLE} (omeka_id)"
            ),
            [],
        )?;

        Ok(())
    }

    /// Drop the plugin side table
    pub fn drop_plugin_schema(&self) -> Result<()> {
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {EXTERNAL_IMAGES_TABLE}"), [])?;
        Ok(())
    }

    pub fn has_plugin_schema(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [EXTERNAL_IMAGES_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
