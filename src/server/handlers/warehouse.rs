//! Warehouse management endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{fail, ok, ok_data};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List warehouse items with their extraction status.
pub async fn list_warehouse(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(10).clamp(1, 200);
    let offset = params.offset.unwrap_or(0);

    let items = match state.warehouse.list(params.keyword.as_deref(), limit, offset) {
        Ok(items) => items,
        Err(e) => return fail(e),
    };

    let mut data = Vec::with_capacity(items.len());
    for item in &items {
        let detail = state.details.get(item.id).ok().flatten();
        data.push(json!({
            "id": item.id,
            "title": item.title,
            "content": item.content,
            "source": item.source,
            "url": item.url,
            "published_at": item.published_at.to_rfc3339(),
            "created_at": item.created_at.to_rfc3339(),
            "is_collected": detail.as_ref().map(|d| d.is_collected).unwrap_or(false),
        }));
    }
    ok_data("ok", Value::Array(data))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Update a warehouse item's curator-editable fields.
pub async fn update_warehouse_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemBody>,
) -> Json<Value> {
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return fail("title and content are required");
    }

    let mut item = match state.warehouse.get(id) {
        Ok(Some(item)) => item,
        Ok(None) => return fail("item not found"),
        Err(e) => return fail(e),
    };

    item.title = body.title;
    item.content = body.content;
    if let Some(source) = body.source {
        item.source = source;
    }
    if let Some(url) = body.url {
        item.url = url;
    }
    if let Some(published_at) = body.published_at {
        item.published_at = published_at;
    }

    match state.warehouse.update(&item) {
        Ok(true) => ok("item updated"),
        Ok(false) => fail("item not found"),
        Err(e) => fail(e),
    }
}

/// Delete one warehouse item (detail record cascades).
pub async fn delete_warehouse_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    match state.warehouse.delete(id) {
        Ok(true) => ok("item deleted"),
        Ok(false) => fail("item not found"),
        Err(e) => fail(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteBody {
    pub ids: Vec<i64>,
}

/// Delete a batch of warehouse items.
pub async fn batch_delete_warehouse(
    State(state): State<AppState>,
    Json(body): Json<BatchDeleteBody>,
) -> Json<Value> {
    if body.ids.is_empty() {
        return fail("no items selected for deletion");
    }
    match state.warehouse.delete_many(&body.ids) {
        Ok(removed) => ok_data("items deleted", json!({ "removed": removed })),
        Err(e) => fail(e),
    }
}
