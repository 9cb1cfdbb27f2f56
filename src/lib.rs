//! NewsVault - news content acquisition and detail-extraction system.
//!
//! Harvested listing items land in a per-collector staging area, a curator
//! promotes them into the permanent warehouse, and the extraction pipeline
//! fetches each warehoused item's source URL to pull a clean title/body
//! using a per-site rule (an XPath pair plus custom request headers).

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod server;
pub mod services;
pub mod xpath;
