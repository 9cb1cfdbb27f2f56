//! Warehouse repository for SQLite persistence.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::{parse_datetime, Result};
use crate::models::{StagedItem, WarehouseItem};

/// SQLite-backed warehouse repository.
pub struct WarehouseRepository {
    db_path: PathBuf,
}

impl WarehouseRepository {
    /// Create a new warehouse repository.
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
            CREATE TABLE IF NOT EXISTS warehouse_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                published_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                collected_by INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_warehouse_url ON warehouse_items(url);
        "#,
        )?;
        Ok(())
    }

    fn row_to_item(row: &Row) -> rusqlite::Result<WarehouseItem> {
        Ok(WarehouseItem {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            source: row.get("source")?,
            url: row.get("url")?,
            published_at: parse_datetime(&row.get::<_, String>("published_at")?),
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            collected_by: row.get("collected_by")?,
        })
    }

    /// Get a warehouse item by ID.
    pub fn get(&self, id: i64) -> Result<Option<WarehouseItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM warehouse_items WHERE id = ?")?;
        let item = stmt.query_row(params![id], Self::row_to_item).optional()?;
        Ok(item)
    }

    /// Check whether a URL is already warehoused.
    pub fn url_exists(&self, url: &str) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM warehouse_items WHERE url = ?",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List warehouse items, newest first, optionally filtered by a keyword
    /// against title or content.
    pub fn list(&self, keyword: Option<&str>, limit: u32, offset: u32) -> Result<Vec<WarehouseItem>> {
        let conn = self.connect()?;
        let pattern = keyword.map(|k| format!("%{}%", k));

        let mut stmt = conn.prepare(
            "SELECT * FROM warehouse_items
             WHERE (?1 IS NULL OR title LIKE ?1 OR content LIKE ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let items = stmt
            .query_map(params![pattern, limit, offset], Self::row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Promote a staged item into the warehouse.
    ///
    /// Returns `None` if an item with the same URL is already warehoused.
    pub fn promote(&self, staged: &StagedItem, actor: i64) -> Result<Option<i64>> {
        if !staged.url.is_empty() && self.url_exists(&staged.url)? {
            return Ok(None);
        }

        let conn = self.connect()?;
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO warehouse_items (title, content, source, url, published_at, created_at, collected_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                staged.title,
                staged.content,
                staged.source,
                staged.url,
                staged.published_at.unwrap_or(now).to_rfc3339(),
                now.to_rfc3339(),
                actor,
            ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Update a warehouse item's curator-editable fields.
    pub fn update(&self, item: &WarehouseItem) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute(
            r#"
            UPDATE warehouse_items
            SET title = ?2, content = ?3, source = ?4, url = ?5, published_at = ?6
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.title,
                item.content,
                item.source,
                item.url,
                item.published_at.to_rfc3339(),
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a warehouse item. The detail record cascades.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM warehouse_items WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    /// Delete a batch of warehouse items, returning how many were removed.
    pub fn delete_many(&self, ids: &[i64]) -> Result<usize> {
        let conn = self.connect()?;
        let mut removed = 0;
        for id in ids {
            removed += conn.execute("DELETE FROM warehouse_items WHERE id = ?", params![id])?;
        }
        Ok(removed)
    }
}
