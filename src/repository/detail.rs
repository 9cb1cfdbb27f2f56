//! Detail record repository for SQLite persistence.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::{parse_datetime, Result};
use crate::models::DetailRecord;

/// SQLite-backed detail record repository.
///
/// One record per warehouse item; re-running extraction updates the
/// existing row in place. Rows cascade away with their warehouse item.
pub struct DetailRepository {
    db_path: PathBuf,
}

impl DetailRepository {
    /// Create a new detail record repository.
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
            CREATE TABLE IF NOT EXISTS detail_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                warehouse_id INTEGER NOT NULL UNIQUE
                    REFERENCES warehouse_items(id) ON DELETE CASCADE,
                detailed_title TEXT NOT NULL DEFAULT '',
                detailed_content TEXT NOT NULL DEFAULT '',
                raw_html TEXT NOT NULL DEFAULT '',
                is_collected INTEGER NOT NULL DEFAULT 0,
                collection_error TEXT,
                collected_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<DetailRecord> {
        Ok(DetailRecord {
            id: row.get("id")?,
            warehouse_id: row.get("warehouse_id")?,
            detailed_title: row.get("detailed_title")?,
            detailed_content: row.get("detailed_content")?,
            raw_html: row.get("raw_html")?,
            is_collected: row.get("is_collected")?,
            collection_error: row.get("collection_error")?,
            collected_at: parse_datetime(&row.get::<_, String>("collected_at")?),
        })
    }

    /// Get the detail record for a warehouse item.
    pub fn get(&self, warehouse_id: i64) -> Result<Option<DetailRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM detail_records WHERE warehouse_id = ?")?;
        let record = stmt
            .query_row(params![warehouse_id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Write the extraction outcome for a warehouse item, updating the
    /// existing record in place when one exists.
    #[allow(clippy::too_many_arguments)]
    pub fn upsert(
        &self,
        warehouse_id: i64,
        title: &str,
        content: &str,
        raw_html: &str,
        is_collected: bool,
        error: Option<&str>,
    ) -> Result<DetailRecord> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO detail_records (warehouse_id, detailed_title, detailed_content, raw_html, is_collected, collection_error, collected_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(warehouse_id) DO UPDATE SET
                detailed_title = excluded.detailed_title,
                detailed_content = excluded.detailed_content,
                raw_html = excluded.raw_html,
                is_collected = excluded.is_collected,
                collection_error = excluded.collection_error,
                collected_at = excluded.collected_at
            "#,
            params![
                warehouse_id,
                title,
                content,
                raw_html,
                is_collected,
                error,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let mut stmt = conn.prepare("SELECT * FROM detail_records WHERE warehouse_id = ?")?;
        let record = stmt.query_row(params![warehouse_id], Self::row_to_record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StagedItem;
    use crate::repository::WarehouseRepository;
    use tempfile::tempdir;

    fn warehouse_item(db: &Path) -> i64 {
        let warehouse = WarehouseRepository::new(db).unwrap();
        warehouse
            .promote(
                &StagedItem {
                    id: 0,
                    title: "t".to_string(),
                    summary: String::new(),
                    content: String::new(),
                    source: "SiteA".to_string(),
                    url: "http://x/a".to_string(),
                    cover: String::new(),
                    collected_by: 1,
                    collected_at: Utc::now(),
                    published_at: None,
                },
                1,
            )
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("t.db");
        let item_id = warehouse_item(&db);
        let repo = DetailRepository::new(&db).unwrap();

        let first = repo
            .upsert(item_id, "T", "Body", "<html/>", true, None)
            .unwrap();
        let second = repo
            .upsert(item_id, "T2", "Body2", "<html/>", true, None)
            .unwrap();

        // Same row updated in place, timestamp refreshed.
        assert_eq!(first.id, second.id);
        assert_eq!(second.detailed_title, "T2");
        assert!(second.collected_at >= first.collected_at);

        let conn = super::super::connect(&db).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM detail_records", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_cascade_delete_with_item() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("t.db");
        let item_id = warehouse_item(&db);
        let repo = DetailRepository::new(&db).unwrap();
        repo.upsert(item_id, "T", "Body", "", true, None).unwrap();

        let warehouse = WarehouseRepository::new(&db).unwrap();
        assert!(warehouse.delete(item_id).unwrap());
        assert!(repo.get(item_id).unwrap().is_none());
    }

    #[test]
    fn test_failure_record_fields() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("t.db");
        let item_id = warehouse_item(&db);
        let repo = DetailRepository::new(&db).unwrap();

        let record = repo
            .upsert(item_id, "", "", "<html/>", false, Some("no title or content"))
            .unwrap();
        assert!(!record.is_collected);
        assert_eq!(record.collection_error.as_deref(), Some("no title or content"));
    }
}
