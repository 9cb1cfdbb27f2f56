//! Extraction rule CRUD endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{actor_id, fail, ok, ok_data};
use crate::models::ExtractionRule;

#[derive(Debug, Deserialize)]
pub struct RuleBody {
    pub site_name: String,
    pub site_url: String,
    pub title_xpath: String,
    pub content_xpath: String,
    /// Header mapping as a JSON object (stored as a text blob).
    pub request_headers: Option<Value>,
}

impl RuleBody {
    fn validate(&self) -> Result<(), &'static str> {
        if self.site_name.trim().is_empty()
            || self.site_url.trim().is_empty()
            || self.title_xpath.trim().is_empty()
            || self.content_xpath.trim().is_empty()
        {
            return Err("site name, site url, title xpath and content xpath are required");
        }
        Ok(())
    }

    fn headers_blob(&self) -> Option<String> {
        self.request_headers.as_ref().map(|v| v.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn rule_json(rule: &ExtractionRule) -> Value {
    // Malformed stored header JSON reads back as "no headers".
    let headers: Value = rule
        .request_headers
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| json!({}));

    json!({
        "id": rule.id,
        "site_name": rule.site_name,
        "site_url": rule.site_url,
        "title_xpath": rule.title_xpath,
        "content_xpath": rule.content_xpath,
        "request_headers": headers,
        "created_at": rule.created_at.to_rfc3339(),
        "updated_at": rule.updated_at.to_rfc3339(),
    })
}

/// List rules, optionally filtered by keyword.
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let offset = params.offset.unwrap_or(0);
    match state.rules.list(params.keyword.as_deref(), limit, offset) {
        Ok(rules) => ok_data(
            "ok",
            Value::Array(rules.iter().map(rule_json).collect()),
        ),
        Err(e) => fail(e),
    }
}

/// Get a single rule.
pub async fn get_rule(State(state): State<AppState>, Path(id): Path<i64>) -> Json<Value> {
    match state.rules.get(id) {
        Ok(Some(rule)) => ok_data("ok", rule_json(&rule)),
        Ok(None) => fail("rule not found"),
        Err(e) => fail(e),
    }
}

/// Create a rule.
pub async fn create_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RuleBody>,
) -> Json<Value> {
    if let Err(msg) = body.validate() {
        return fail(msg);
    }

    match state.rules.create(
        body.site_name.trim(),
        body.site_url.trim(),
        body.title_xpath.trim(),
        body.content_xpath.trim(),
        body.headers_blob().as_deref(),
        actor_id(&headers),
    ) {
        Ok(id) => ok_data("rule created", json!({ "id": id })),
        Err(e) => fail(e),
    }
}

/// Update a rule.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RuleBody>,
) -> Json<Value> {
    if let Err(msg) = body.validate() {
        return fail(msg);
    }

    match state.rules.update(
        id,
        body.site_name.trim(),
        body.site_url.trim(),
        body.title_xpath.trim(),
        body.content_xpath.trim(),
        body.headers_blob().as_deref(),
    ) {
        Ok(true) => ok("rule updated"),
        Ok(false) => fail("rule not found"),
        Err(e) => fail(e),
    }
}

/// Delete a rule.
pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> Json<Value> {
    match state.rules.delete(id) {
        Ok(true) => ok("rule deleted"),
        Ok(false) => fail("rule not found"),
        Err(e) => fail(e),
    }
}

/// Auto-repair revision history for a rule.
pub async fn rule_revisions(State(state): State<AppState>, Path(id): Path<i64>) -> Json<Value> {
    match state.rules.revisions(id) {
        Ok(revisions) => {
            let data: Vec<Value> = revisions
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "old_title_xpath": r.old_title_xpath,
                        "new_title_xpath": r.new_title_xpath,
                        "old_content_xpath": r.old_content_xpath,
                        "new_content_xpath": r.new_content_xpath,
                        "triggered_by_item": r.triggered_by_item,
                        "changed_at": r.changed_at.to_rfc3339(),
                    })
                })
                .collect();
            ok_data("ok", Value::Array(data))
        }
        Err(e) => fail(e),
    }
}
