// OptionRepository - host key/value option store

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Key/value option store owned by the host
pub trait OptionRepository {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&self, name: &str, value: &str) -> Result<()>;
    fn delete(&self, name: &str) -> Result<()>;
}

/// SQLite implementation of OptionRepository
pub struct SqliteOptionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteOptionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> OptionRepository for SqliteOptionRepository<'a> {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM options WHERE name = ?1", [name])?;
        Ok(())
    }
}
