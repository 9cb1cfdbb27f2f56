//! Staged and warehoused content items.
//!
//! Storage is two-tier: harvesters drop raw listing items into a
//! per-collector staging area, and a curator promotes selected items into
//! the permanent warehouse. The warehouse URL is the dedup key on
//! promotion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw harvested listing item, owned by the collector who harvested it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedItem {
    /// Database row ID.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    /// Site identifier (free-text label, joined to rules on promotion).
    #[serde(default)]
    pub source: String,
    pub url: String,
    #[serde(default)]
    pub cover: String,
    /// Actor who harvested this item.
    #[serde(default)]
    pub collected_by: i64,
    #[serde(default = "Utc::now")]
    pub collected_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A promoted, permanent content record.
///
/// Never mutated by the extraction core except indirectly through its
/// associated `DetailRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseItem {
    /// Database row ID.
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Site identifier, matched to extraction rules by exact string equality.
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Actor who promoted this item.
    pub collected_by: i64,
}
