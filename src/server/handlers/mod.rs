//! Request handlers for the web API.

mod extraction;
mod helpers;
mod rules;
mod staging;
mod warehouse;

pub use extraction::{extract_batch, extract_item, read_detail};
pub use rules::{create_rule, delete_rule, get_rule, list_rules, rule_revisions, update_rule};
pub use staging::{clear_staged, import_staged, list_staged, promote_staged};
pub use warehouse::{
    batch_delete_warehouse, delete_warehouse_item, list_warehouse, update_warehouse_item,
};
