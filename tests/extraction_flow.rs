//! End-to-end extraction flow tests.
//!
//! Exercises the full pipeline (rule lookup, fetch, extraction, auto-repair,
//! detail persistence) against a stub fetcher serving canned HTML, so no
//! network is involved.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::tempdir;

use newsvault::config::Settings;
use newsvault::models::StagedItem;
use newsvault::server::AppState;
use newsvault::services::{FetchError, FetchedPage, Outcome, PageFetcher};

/// Serves canned HTML per URL; unknown URLs fail with a transport error.
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url) {
            Some(html) => Ok(FetchedPage {
                status: 200,
                html: html.clone(),
            }),
            None => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn test_settings(dir: &tempfile::TempDir) -> Settings {
    Settings {
        data_dir: dir.path().to_path_buf(),
        bind: "127.0.0.1:0".to_string(),
    }
}

fn staged(source: &str, url: &str) -> StagedItem {
    StagedItem {
        id: 0,
        title: "listing title".to_string(),
        summary: String::new(),
        content: String::new(),
        source: source.to_string(),
        url: url.to_string(),
        cover: String::new(),
        collected_by: 1,
        collected_at: Utc::now(),
        published_at: None,
    }
}

fn state_with(fetcher: StubFetcher, settings: &Settings) -> AppState {
    AppState::with_fetcher(settings, Arc::new(fetcher)).unwrap()
}

#[tokio::test]
async fn extraction_writes_detail_record() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    let state = state_with(
        StubFetcher::new().with_page(
            "http://site-a.example/news/1",
            "<html><body><h1>T</h1><div class='content'><p>Body</p> <p>text</p></div></body></html>",
        ),
        &settings,
    );

    state
        .rules
        .create(
            "SiteA",
            "http://site-a.example",
            "//h1",
            "//div[@class='content']",
            None,
            1,
        )
        .unwrap();
    let item_id = state
        .warehouse
        .promote(&staged("SiteA", "http://site-a.example/news/1"), 1)
        .unwrap()
        .unwrap();

    let report = state.pipeline.run_one(item_id).await;
    assert_eq!(
        report.outcome,
        Outcome::Success {
            auto_repaired: false
        }
    );

    let record = state.details.get(item_id).unwrap().unwrap();
    assert!(record.is_collected);
    assert_eq!(record.detailed_title, "T");
    assert_eq!(record.detailed_content, "Body text");
    assert!(record.raw_html.contains("<h1>T</h1>"));
    assert!(record.collection_error.is_none());
}

#[tokio::test]
async fn stale_rule_is_auto_repaired() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    let long_body = "x".repeat(150);
    let html = format!(
        "<html><body><h1>Headline</h1><article>{}</article></body></html>",
        long_body
    );
    let state = state_with(
        StubFetcher::new().with_page("http://site-b.example/news/1", &html),
        &settings,
    );

    // Both stored xpaths match nothing in the fetched page.
    let rule_id = state
        .rules
        .create(
            "SiteB",
            "http://site-b.example",
            "//div[@class='old-title']",
            "//div[@class='old-body']",
            None,
            1,
        )
        .unwrap();
    let item_id = state
        .warehouse
        .promote(&staged("SiteB", "http://site-b.example/news/1"), 1)
        .unwrap()
        .unwrap();

    let report = state.pipeline.run_one(item_id).await;
    assert_eq!(report.outcome, Outcome::Success { auto_repaired: true });

    let record = state.details.get(item_id).unwrap().unwrap();
    assert!(record.is_collected);
    assert_eq!(record.detailed_title, "Headline");
    assert_eq!(record.detailed_content, long_body);

    // The rule itself was mutated and the change audited.
    let rule = state.rules.get(rule_id).unwrap().unwrap();
    assert_eq!(rule.title_xpath, "//h1");
    assert_eq!(rule.content_xpath, "//article");
    let revisions = state.rules.revisions(rule_id).unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].triggered_by_item, item_id);
    assert_eq!(revisions[0].old_content_xpath, "//div[@class='old-body']");
    assert_eq!(revisions[0].new_content_xpath, "//article");
}

#[tokio::test]
async fn repair_refuses_short_content() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    // Under the length threshold, so no candidate qualifies.
    let state = state_with(
        StubFetcher::new().with_page(
            "http://site-c.example/news/1",
            "<html><body><article>too short</article></body></html>",
        ),
        &settings,
    );

    state
        .rules
        .create(
            "SiteC",
            "http://site-c.example",
            "//div[@class='missing']",
            "//div[@class='missing']",
            None,
            1,
        )
        .unwrap();
    let item_id = state
        .warehouse
        .promote(&staged("SiteC", "http://site-c.example/news/1"), 1)
        .unwrap()
        .unwrap();

    let report = state.pipeline.run_one(item_id).await;
    assert_eq!(
        report.outcome,
        Outcome::Failure {
            message: "no title or content extracted and rule could not be auto-updated"
                .to_string()
        }
    );

    let record = state.details.get(item_id).unwrap().unwrap();
    assert!(!record.is_collected);
    assert!(record.collection_error.is_some());
}

#[tokio::test]
async fn batch_isolates_per_item_failures() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    let page = "<html><body><h1>T</h1><div class='content'>C</div></body></html>";
    // Item 2's URL is unknown to the stub, so its fetch fails.
    let state = state_with(
        StubFetcher::new()
            .with_page("http://site-a.example/news/1", page)
            .with_page("http://site-a.example/news/3", page),
        &settings,
    );

    state
        .rules
        .create(
            "SiteA",
            "http://site-a.example",
            "//h1",
            "//div[@class='content']",
            None,
            1,
        )
        .unwrap();

    let mut ids = Vec::new();
    for n in 1..=3 {
        let url = format!("http://site-a.example/news/{}", n);
        let id = state
            .warehouse
            .promote(&staged("SiteA", &url), 1)
            .unwrap()
            .unwrap();
        ids.push(id);
    }

    let report = state.batch.run(&ids).await;
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.summary(), "batch complete, success:2, failed:1");
    assert_eq!(report.items.len(), 3);
    assert!(report.items[0].outcome.is_success());
    assert!(!report.items[1].outcome.is_success());
    assert!(report.items[2].outcome.is_success());

    // The failed item still gets a failure record for audit.
    let failed = state.details.get(ids[1]).unwrap().unwrap();
    assert!(!failed.is_collected);
    assert!(failed
        .collection_error
        .as_deref()
        .unwrap()
        .starts_with("fetch error:"));
    assert!(state.details.get(ids[0]).unwrap().unwrap().is_collected);
    assert!(state.details.get(ids[2]).unwrap().unwrap().is_collected);
}

#[tokio::test]
async fn rerun_overwrites_existing_record() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    let state = state_with(
        StubFetcher::new().with_page(
            "http://site-a.example/news/1",
            "<html><body><h1>T</h1><div class='content'>C</div></body></html>",
        ),
        &settings,
    );

    state
        .rules
        .create(
            "SiteA",
            "http://site-a.example",
            "//h1",
            "//div[@class='content']",
            None,
            1,
        )
        .unwrap();
    let item_id = state
        .warehouse
        .promote(&staged("SiteA", "http://site-a.example/news/1"), 1)
        .unwrap()
        .unwrap();

    let first = state.pipeline.run_one(item_id).await;
    let second = state.pipeline.run_one(item_id).await;
    assert!(first.outcome.is_success());
    assert!(second.outcome.is_success());

    // Still exactly one record for the item.
    let record = state.details.get(item_id).unwrap().unwrap();
    assert_eq!(record.warehouse_id, item_id);
    assert_eq!(record.detailed_title, "T");
}

#[tokio::test]
async fn item_without_rule_fails_without_record() {
    let dir = tempdir().unwrap();
    let settings = test_settings(&dir);
    let state = state_with(StubFetcher::new(), &settings);

    let item_id = state
        .warehouse
        .promote(&staged("Unknown", "http://nowhere.example/1"), 1)
        .unwrap()
        .unwrap();

    let report = state.pipeline.run_one(item_id).await;
    assert_eq!(
        report.outcome,
        Outcome::Failure {
            message: "no rule for source Unknown".to_string()
        }
    );
    // Pre-fetch failures write nothing.
    assert!(state.details.get(item_id).unwrap().is_none());
}
