//! Extraction rule repository for SQLite persistence.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{parse_datetime, RepositoryError, Result};
use crate::models::{ExtractionRule, RuleRevision};
use crate::xpath::Xpath;

/// SQLite-backed extraction rule repository.
///
/// Site names are unique at write time; lookup still orders by primary key
/// so databases created before the constraint keep deterministic behavior.
pub struct RuleRepository {
    db_path: PathBuf,
}

impl RuleRepository {
    /// Create a new rule repository.
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
            CREATE TABLE IF NOT EXISTS extraction_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_name TEXT NOT NULL,
                site_url TEXT NOT NULL DEFAULT '',
                title_xpath TEXT NOT NULL,
                content_xpath TEXT NOT NULL,
                request_headers TEXT,
                created_by INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rules_site ON extraction_rules(site_name);

            CREATE TABLE IF NOT EXISTS rule_revisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rule_id INTEGER NOT NULL REFERENCES extraction_rules(id) ON DELETE CASCADE,
                old_title_xpath TEXT NOT NULL,
                new_title_xpath TEXT NOT NULL,
                old_content_xpath TEXT NOT NULL,
                new_content_xpath TEXT NOT NULL,
                triggered_by_item INTEGER NOT NULL,
                changed_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn row_to_rule(row: &Row) -> rusqlite::Result<ExtractionRule> {
        Ok(ExtractionRule {
            id: row.get("id")?,
            site_name: row.get("site_name")?,
            site_url: row.get("site_url")?,
            title_xpath: row.get("title_xpath")?,
            content_xpath: row.get("content_xpath")?,
            request_headers: row.get("request_headers")?,
            created_by: row.get("created_by")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        })
    }

    fn validate_xpaths(title_xpath: &str, content_xpath: &str) -> Result<()> {
        Xpath::compile(title_xpath)?;
        Xpath::compile(content_xpath)?;
        Ok(())
    }

    fn site_taken(&self, conn: &Connection, site_name: &str, exclude: Option<i64>) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM extraction_rules WHERE site_name = ?1 AND (?2 IS NULL OR id != ?2)",
            params![site_name, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a rule by ID.
    pub fn get(&self, id: i64) -> Result<Option<ExtractionRule>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM extraction_rules WHERE id = ?")?;
        let rule = stmt.query_row(params![id], Self::row_to_rule).optional()?;
        Ok(rule)
    }

    /// Find the rule for a site identifier: exact match, first by primary
    /// key when legacy duplicates exist.
    pub fn find_by_site(&self, site_name: &str) -> Result<Option<ExtractionRule>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT * FROM extraction_rules WHERE site_name = ? ORDER BY id LIMIT 1")?;
        let rule = stmt
            .query_row(params![site_name], Self::row_to_rule)
            .optional()?;
        Ok(rule)
    }

    /// List rules, most recently updated first, optionally filtered by a
    /// keyword against site name or URL.
    pub fn list(&self, keyword: Option<&str>, limit: u32, offset: u32) -> Result<Vec<ExtractionRule>> {
        let conn = self.connect()?;
        let pattern = keyword.map(|k| format!("%{}%", k));
        let mut stmt = conn.prepare(
            "SELECT * FROM extraction_rules
             WHERE (?1 IS NULL OR site_name LIKE ?1 OR site_url LIKE ?1)
             ORDER BY updated_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rules = stmt
            .query_map(params![pattern, limit, offset], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Create a rule. Both XPaths must compile and the site name must be
    /// unused.
    pub fn create(
        &self,
        site_name: &str,
        site_url: &str,
        title_xpath: &str,
        content_xpath: &str,
        request_headers: Option<&str>,
        actor: i64,
    ) -> Result<i64> {
        Self::validate_xpaths(title_xpath, content_xpath)?;

        let conn = self.connect()?;
        if self.site_taken(&conn, site_name, None)? {
            return Err(RepositoryError::DuplicateSite(site_name.to_string()));
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO extraction_rules (site_name, site_url, title_xpath, content_xpath, request_headers, created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![site_name, site_url, title_xpath, content_xpath, request_headers, actor, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update a rule's full definition.
    pub fn update(
        &self,
        id: i64,
        site_name: &str,
        site_url: &str,
        title_xpath: &str,
        content_xpath: &str,
        request_headers: Option<&str>,
    ) -> Result<bool> {
        Self::validate_xpaths(title_xpath, content_xpath)?;

        let conn = self.connect()?;
        if self.site_taken(&conn, site_name, Some(id))? {
            return Err(RepositoryError::DuplicateSite(site_name.to_string()));
        }

        let rows = conn.execute(
            r#"
            UPDATE extraction_rules
            SET site_name = ?2, site_url = ?3, title_xpath = ?4, content_xpath = ?5,
                request_headers = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                site_name,
                site_url,
                title_xpath,
                content_xpath,
                request_headers,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a rule.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM extraction_rules WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    /// Persist auto-repair proposals into a rule, overwriting only the
    /// proposed fields, and record the rewrite in the revision log.
    pub fn apply_repair(
        &self,
        rule: &ExtractionRule,
        new_title_xpath: Option<&str>,
        new_content_xpath: Option<&str>,
        triggered_by_item: i64,
    ) -> Result<()> {
        let title = new_title_xpath.unwrap_or(&rule.title_xpath);
        let content = new_content_xpath.unwrap_or(&rule.content_xpath);

        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE extraction_rules SET title_xpath = ?2, content_xpath = ?3, updated_at = ?4 WHERE id = ?1",
            params![rule.id, title, content, now],
        )?;
        conn.execute(
            r#"
            INSERT INTO rule_revisions (rule_id, old_title_xpath, new_title_xpath, old_content_xpath, new_content_xpath, triggered_by_item, changed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                rule.id,
                rule.title_xpath,
                title,
                rule.content_xpath,
                content,
                triggered_by_item,
                now,
            ],
        )?;

        info!(
            rule_id = rule.id,
            site = %rule.site_name,
            item = triggered_by_item,
            old_title = %rule.title_xpath,
            new_title = %title,
            old_content = %rule.content_xpath,
            new_content = %content,
            "auto-repair rewrote extraction rule"
        );
        Ok(())
    }

    /// Revision history for a rule, newest first.
    pub fn revisions(&self, rule_id: i64) -> Result<Vec<RuleRevision>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM rule_revisions WHERE rule_id = ? ORDER BY id DESC",
        )?;
        let revisions = stmt
            .query_map(params![rule_id], |row| {
                Ok(RuleRevision {
                    id: row.get("id")?,
                    rule_id: row.get("rule_id")?,
                    old_title_xpath: row.get("old_title_xpath")?,
                    new_title_xpath: row.get("new_title_xpath")?,
                    old_content_xpath: row.get("old_content_xpath")?,
                    new_content_xpath: row.get("new_content_xpath")?,
                    triggered_by_item: row.get("triggered_by_item")?,
                    changed_at: parse_datetime(&row.get::<_, String>("changed_at")?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(revisions)
    }
}
