// ElementTextRepository - host metadata texts attached to items and collections

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};

use crate::api_types::RecordRef;

/// Read/write access to element texts owned by the host
pub trait ElementTextRepository {
    /// All texts of one element for a record, in insertion order.
    /// Fails when the record has no element texts at all.
    fn find_texts(&self, record: RecordRef, element_set: &str, element: &str)
        -> Result<Vec<String>>;
    fn replace_texts(
        &self,
        record: RecordRef,
        element_set: &str,
        element: &str,
        texts: &[String],
    ) -> Result<()>;
    fn delete_record(&self, record: RecordRef) -> Result<usize>;
}

/// SQLite implementation of ElementTextRepository
pub struct SqliteElementTextRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteElementTextRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn record_exists(&self, record: RecordRef) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM element_texts WHERE record_type = ?1 AND record_id = ?2",
            params![record.kind.as_str(), record.id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl<'a> ElementTextRepository for SqliteElementTextRepository<'a> {
    fn find_texts(
        &self,
        record: RecordRef,
        element_set: &str,
        element: &str,
    ) -> Result<Vec<String>> {
        if !self.record_exists(record)? {
            return Err(anyhow!(
                "No {} record with id {}",
                record.kind.as_str(),
                record.id
            ));
        }

        let mut stmt = self.conn.prepare(
            "SELECT text FROM element_texts
             WHERE record_type = ?1 AND record_id = ?2
               AND element_set = ?3 AND element_name = ?4
             ORDER BY id ASC",
        )?;

        let text_iter = stmt.query_map(
            params![record.kind.as_str(), record.id, element_set, element],
            |row| row.get(0),
        )?;

        let mut texts = Vec::new();
        for text in text_iter {
            texts.push(text?);
        }
        Ok(texts)
    }

    fn replace_texts(
        &self,
        record: RecordRef,
        element_set: &str,
        element: &str,
        texts: &[String],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM element_texts
             WHERE record_type = ?1 AND record_id = ?2
               AND element_set = ?3 AND element_name = ?4",
            params![record.kind.as_str(), record.id, element_set, element],
        )?;

        for text in texts {
            tx.execute(
                "INSERT INTO element_texts (record_type, record_id, element_set, element_name, text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![record.kind.as_str(), record.id, element_set, element, text],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_record(&self, record: RecordRef) -> Result<usize> {
        let affected_rows = self.conn.execute(
            "DELETE FROM element_texts WHERE record_type = ?1 AND record_id = ?2",
            params![record.kind.as_str(), record.id],
        )?;
        Ok(affected_rows)
    }
}
