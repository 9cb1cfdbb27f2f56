//! Shared handler helpers: result envelopes and actor identity.
//!
//! Every API response uses the `{code, msg, data}` envelope: code 0 for
//! success, 1 for failure. Failures carry a message, never a stack trace.

use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

/// Success envelope with a message only.
pub fn ok(msg: &str) -> Json<Value> {
    Json(json!({ "code": 0, "msg": msg }))
}

/// Success envelope with a message and payload.
pub fn ok_data(msg: &str, data: Value) -> Json<Value> {
    Json(json!({ "code": 0, "msg": msg, "data": data }))
}

/// Failure envelope.
pub fn fail(msg: impl std::fmt::Display) -> Json<Value> {
    Json(json!({ "code": 1, "msg": msg.to_string() }))
}

/// Actor identity, supplied by the external auth collaborator as an
/// opaque header. Absent or unparsable means "unknown actor" (0).
pub fn actor_id(headers: &HeaderMap) -> i64 {
    headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
