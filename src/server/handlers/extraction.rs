//! Detail extraction endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{fail, ok_data};
use crate::services::ItemReport;

/// Run the single-item pipeline for one warehouse item.
pub async fn extract_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    let report = state.pipeline.run_one(id).await;
    if report.outcome.is_success() {
        ok_data(&report.outcome.message(), json!({ "item_id": id }))
    } else {
        fail(report.outcome.message())
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchExtractBody {
    pub ids: Vec<i64>,
}

/// Run the pipeline over a batch of warehouse items.
pub async fn extract_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchExtractBody>,
) -> Json<Value> {
    if body.ids.is_empty() {
        return fail("no items selected for extraction");
    }

    // A wholly unknown id list cannot start a batch; individual missing
    // ids are counted as per-item failures.
    let mut any_exists = false;
    for &id in &body.ids {
        match state.warehouse.get(id) {
            Ok(Some(_)) => any_exists = true,
            Ok(None) => {}
            Err(e) => return fail(e),
        }
    }
    if !any_exists {
        return fail("no matching items found");
    }

    let report = state.batch.run(&body.ids).await;
    ok_data(&report.summary(), json!({ "items": item_reports(&report.items) }))
}

fn item_reports(items: &[ItemReport]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|r| {
                json!({
                    "item_id": r.item_id,
                    "success": r.outcome.is_success(),
                    "msg": r.outcome.message(),
                })
            })
            .collect(),
    )
}

/// Read the extraction result for a warehouse item. A missing record is
/// not an error: all-empty defaults come back with code 0.
pub async fn read_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    match state.details.get(id) {
        Ok(Some(record)) => ok_data(
            "ok",
            json!({
                "detailed_title": record.detailed_title,
                "detailed_content": record.detailed_content,
                "is_collected": record.is_collected,
                "collected_at": record.collected_at.to_rfc3339(),
                "collection_error": record.collection_error,
            }),
        ),
        Ok(None) => ok_data(
            "no detail record yet",
            json!({
                "detailed_title": "",
                "detailed_content": "",
                "is_collected": false,
                "collected_at": null,
                "collection_error": "",
            }),
        ),
        Err(e) => fail(e),
    }
}
