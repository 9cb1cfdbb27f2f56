//! Staging area endpoints: import, list, promote, clear.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{actor_id, fail, ok_data};
use crate::models::StagedItem;

#[derive(Debug, Deserialize)]
pub struct ImportBody {
    pub items: Vec<StagedItem>,
}

/// Import harvested listing items into the caller's staging area,
/// skipping unusable URLs and URLs the caller already staged.
pub async fn import_staged(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImportBody>,
) -> Json<Value> {
    let actor = actor_id(&headers);
    let mut saved = 0;
    for item in &body.items {
        if url::Url::parse(item.url.trim()).is_err() {
            continue;
        }
        let mut item = item.clone();
        item.collected_by = actor;
        match state.staging.insert_if_new(&item) {
            Ok(true) => saved += 1,
            Ok(false) => {}
            Err(e) => return fail(e),
        }
    }
    ok_data(
        &format!("import complete, {} new items staged", saved),
        json!({ "saved": saved }),
    )
}

/// List the caller's staged items.
pub async fn list_staged(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match state.staging.list_for(actor_id(&headers)) {
        Ok(items) => {
            let data: Vec<Value> = items
                .iter()
                .map(|item| {
                    json!({
                        "id": item.id,
                        "title": item.title,
                        "summary": item.summary,
                        "content": item.content,
                        "source": item.source,
                        "url": item.url,
                        "cover": item.cover,
                        "collected_at": item.collected_at.to_rfc3339(),
                    })
                })
                .collect();
            ok_data("ok", Value::Array(data))
        }
        Err(e) => fail(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct PromoteBody {
    pub ids: Vec<i64>,
}

/// Promote staged items into the warehouse. URL duplicates are skipped;
/// promoted rows leave the staging area.
pub async fn promote_staged(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PromoteBody>,
) -> Json<Value> {
    if body.ids.is_empty() {
        return fail("no items selected for promotion");
    }

    let actor = actor_id(&headers);
    let mut saved = 0;
    for &id in &body.ids {
        let staged = match state.staging.get(id) {
            Ok(Some(staged)) => staged,
            Ok(None) => continue,
            Err(e) => return fail(e),
        };
        match state.warehouse.promote(&staged, actor) {
            Ok(Some(_)) => {
                saved += 1;
                if let Err(e) = state.staging.delete(id) {
                    return fail(e);
                }
            }
            Ok(None) => {} // already warehoused
            Err(e) => return fail(e),
        }
    }
    ok_data(
        &format!("{} items saved to warehouse", saved),
        json!({ "saved": saved }),
    )
}

/// Clear the caller's staging area.
pub async fn clear_staged(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match state.staging.clear_for(actor_id(&headers)) {
        Ok(removed) => ok_data("staging cleared", json!({ "removed": removed })),
        Err(e) => fail(e),
    }
}
