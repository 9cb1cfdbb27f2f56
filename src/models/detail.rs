//! Extraction outcome records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The extraction outcome for exactly one warehouse item.
///
/// Unique on `warehouse_id`: re-running extraction updates the record in
/// place. `is_collected` is true iff title or content is non-empty after
/// the full pipeline (including auto-repair) completes.
#[derive(Debug, Clone, Serialize)]
pub struct DetailRecord {
    /// Database row ID.
    pub id: i64,
    /// Owning warehouse item (one record per item).
    pub warehouse_id: i64,
    pub detailed_title: String,
    pub detailed_content: String,
    /// Raw fetched HTML, retained for audit and rule debugging.
    pub raw_html: String,
    pub is_collected: bool,
    /// Set only on failure or empty extraction.
    pub collection_error: Option<String>,
    pub collected_at: DateTime<Utc>,
}
