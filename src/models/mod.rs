//! Domain models for staging, warehouse, rules, and extraction outcomes.

mod detail;
mod rule;
mod warehouse;

pub use detail::DetailRecord;
pub use rule::{ExtractionRule, RuleRevision};
pub use warehouse::{StagedItem, WarehouseItem};
