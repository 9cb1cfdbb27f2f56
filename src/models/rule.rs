//! Per-site extraction rules and their change history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A per-site content-extraction recipe: an XPath pair plus custom request
/// headers.
///
/// Rules are created by administrators but may also be rewritten by the
/// auto-repair step when the configured XPaths stop matching; every such
/// rewrite is recorded as a [`RuleRevision`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Database row ID.
    pub id: i64,
    /// Site identifier, matched against `WarehouseItem.source`.
    pub site_name: String,
    /// Informational; not used for matching.
    pub site_url: String,
    pub title_xpath: String,
    pub content_xpath: String,
    /// JSON-encoded header mapping. Malformed JSON is treated as "no
    /// headers" on read, never as a fatal error.
    pub request_headers: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record for an auto-repair rewrite of a rule's XPaths.
#[derive(Debug, Clone, Serialize)]
pub struct RuleRevision {
    pub id: i64,
    pub rule_id: i64,
    pub old_title_xpath: String,
    pub new_title_xpath: String,
    pub old_content_xpath: String,
    pub new_content_xpath: String,
    /// Warehouse item whose extraction triggered the rewrite.
    pub triggered_by_item: i64,
    pub changed_at: DateTime<Utc>,
}
