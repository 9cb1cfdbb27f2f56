//! Staging repository for harvested listing items.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::{parse_datetime, parse_datetime_opt, Result};
use crate::models::StagedItem;

/// SQLite-backed staging repository.
///
/// Staged items are transient and scoped to the collector who harvested
/// them; (url, collector) is the dedup key at insert time.
pub struct StagingRepository {
    db_path: PathBuf,
}

impl StagingRepository {
    /// Create a new staging repository.
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    fn connect(&self) -> Result<Connection> {
        super::connect(&self.db_path)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS staged_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                source TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                cover TEXT NOT NULL DEFAULT '',
                collected_by INTEGER NOT NULL DEFAULT 0,
                collected_at TEXT NOT NULL,
                published_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_staged_collector ON staged_items(collected_by);
        "#,
        )?;
        Ok(())
    }

    fn row_to_item(row: &Row) -> rusqlite::Result<StagedItem> {
        Ok(StagedItem {
            id: row.get("id")?,
            title: row.get("title")?,
            summary: row.get("summary")?,
            content: row.get("content")?,
            source: row.get("source")?,
            url: row.get("url")?,
            cover: row.get("cover")?,
            collected_by: row.get("collected_by")?,
            collected_at: parse_datetime(&row.get::<_, String>("collected_at")?),
            published_at: parse_datetime_opt(row.get::<_, Option<String>>("published_at")?),
        })
    }

    /// Get a staged item by ID.
    pub fn get(&self, id: i64) -> Result<Option<StagedItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM staged_items WHERE id = ?")?;
        let item = stmt.query_row(params![id], Self::row_to_item).optional()?;
        Ok(item)
    }

    /// Insert a harvested item unless the collector already staged its URL.
    ///
    /// Returns true if a row was inserted.
    pub fn insert_if_new(&self, item: &StagedItem) -> Result<bool> {
        let conn = self.connect()?;
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM staged_items WHERE url = ? AND collected_by = ?",
            params![item.url, item.collected_by],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Ok(false);
        }

        conn.execute(
            r#"
            INSERT INTO staged_items (title, summary, content, source, url, cover, collected_by, collected_at, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                item.title,
                item.summary,
                item.content,
                item.source,
                item.url,
                item.cover,
                item.collected_by,
                Utc::now().to_rfc3339(),
                item.published_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(true)
    }

    /// List a collector's staged items, newest first.
    pub fn list_for(&self, collector: i64) -> Result<Vec<StagedItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM staged_items WHERE collected_by = ? ORDER BY collected_at DESC, id DESC",
        )?;
        let items = stmt
            .query_map(params![collector], Self::row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Delete a staged item (after promotion).
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM staged_items WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    /// Clear all of a collector's staged items, returning how many were
    /// removed.
    pub fn clear_for(&self, collector: i64) -> Result<usize> {
        let conn = self.connect()?;
        let rows = conn.execute(
            "DELETE FROM staged_items WHERE collected_by = ?",
            params![collector],
        )?;
        Ok(rows)
    }
}
