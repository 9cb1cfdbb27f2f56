//! Single-item extraction pipeline.
//!
//! Orchestrates rule lookup, fetch, extraction, auto-repair, and detail
//! record persistence for one warehouse item. Every failure is converted
//! to an [`Outcome::Failure`] at this boundary; nothing propagates as an
//! error to the batch layer.

use std::sync::Arc;

use scraper::Html;
use tracing::{info, warn};

use super::extract::{extract_document, Extracted};
use super::fetch::PageFetcher;
use super::headers::sanitize_headers;
use super::repair::propose_rule;
use crate::models::ExtractionRule;
use crate::repository::{DetailRepository, RepositoryError, RuleRepository, WarehouseRepository};

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { auto_repaired: bool },
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Human-readable result message for the caller.
    pub fn message(&self) -> String {
        match self {
            Outcome::Success {
                auto_repaired: false,
            } => "detail extraction succeeded".to_string(),
            Outcome::Success {
                auto_repaired: true,
            } => "rule auto-updated, detail extraction succeeded".to_string(),
            Outcome::Failure { message } => message.clone(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }
}

/// Per-item result, retained by the batch coordinator.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub item_id: i64,
    pub outcome: Outcome,
}

/// The single-item extraction pipeline.
pub struct ExtractionPipeline {
    warehouse: Arc<WarehouseRepository>,
    rules: Arc<RuleRepository>,
    details: Arc<DetailRepository>,
    fetcher: Arc<dyn PageFetcher>,
}

impl ExtractionPipeline {
    pub fn new(
        warehouse: Arc<WarehouseRepository>,
        rules: Arc<RuleRepository>,
        details: Arc<DetailRepository>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            warehouse,
            rules,
            details,
            fetcher,
        }
    }

    /// Run the pipeline for one warehouse item.
    pub async fn run_one(&self, item_id: i64) -> ItemReport {
        let outcome = match self.run_inner(item_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(item_id, error = %e, "extraction pipeline error");
                Outcome::failure(format!("extraction failed: {}", e))
            }
        };
        ItemReport { item_id, outcome }
    }

    async fn run_inner(&self, item_id: i64) -> Result<Outcome, RepositoryError> {
        // Start: resolve the item and its rule. Failures before the fetch
        // write no record.
        let item = match self.warehouse.get(item_id)? {
            Some(item) => item,
            None => return Ok(Outcome::failure("warehouse item not found")),
        };
        if item.url.is_empty() || item.source.is_empty() {
            return Ok(Outcome::failure("missing url or source"));
        }

        let rule = match self.rules.find_by_site(&item.source)? {
            Some(rule) => rule,
            None => {
                return Ok(Outcome::failure(format!(
                    "no rule for source {}",
                    item.source
                )))
            }
        };

        // Fetched: transport failures are recorded for audit continuity.
        let headers = sanitize_headers(rule.request_headers.as_deref());
        let page = match self.fetcher.fetch(&item.url, &headers).await {
            Ok(page) => page,
            Err(e) => {
                let message = format!("fetch error: {}", e);
                self.details
                    .upsert(item_id, "", "", "", false, Some(&message))?;
                return Ok(Outcome::failure(message));
            }
        };

        // Extracted: an invalid stored XPath behaves like an empty
        // extraction and flows into repair.
        let doc = Html::parse_document(&page.html);
        let extracted = self.try_extract(&doc, &rule, &rule.title_xpath, &rule.content_xpath);

        if extracted.has_any() {
            self.details.upsert(
                item_id,
                &extracted.title,
                &extracted.content,
                &page.html,
                true,
                None,
            )?;
            return Ok(Outcome::Success {
                auto_repaired: false,
            });
        }

        // RepairAttempted: probe heuristics, persist any proposal into the
        // rule (with an audit revision), and re-run extraction once.
        let proposal = propose_rule(&doc);
        if proposal.is_empty() {
            let message = "no title or content extracted and rule could not be auto-updated";
            self.details
                .upsert(item_id, "", "", &page.html, false, Some(message))?;
            return Ok(Outcome::failure(message));
        }

        self.rules.apply_repair(
            &rule,
            proposal.title_xpath.as_deref(),
            proposal.content_xpath.as_deref(),
            item_id,
        )?;
        info!(
            item_id,
            site = %rule.site_name,
            "re-running extraction with auto-repaired rule"
        );

        let title_xpath = proposal.title_xpath.as_deref().unwrap_or(&rule.title_xpath);
        let content_xpath = proposal
            .content_xpath
            .as_deref()
            .unwrap_or(&rule.content_xpath);
        let retried = self.try_extract(&doc, &rule, title_xpath, content_xpath);

        if retried.has_any() {
            self.details.upsert(
                item_id,
                &retried.title,
                &retried.content,
                &page.html,
                true,
                None,
            )?;
            Ok(Outcome::Success {
                auto_repaired: true,
            })
        } else {
            let message = "no title or content extracted, rule auto-update did not help";
            self.details
                .upsert(item_id, "", "", &page.html, false, Some(message))?;
            Ok(Outcome::failure(message))
        }
    }

    fn try_extract(
        &self,
        doc: &Html,
        rule: &ExtractionRule,
        title_xpath: &str,
        content_xpath: &str,
    ) -> Extracted {
        match extract_document(doc, title_xpath, content_xpath) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(
                    rule_id = rule.id,
                    site = %rule.site_name,
                    error = %e,
                    "rule xpath did not compile, treating as empty extraction"
                );
                Extracted::default()
            }
        }
    }
}
