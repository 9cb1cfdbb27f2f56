//! Request header sanitization.
//!
//! Rule headers are stored as a JSON text blob pasted in by curators, so
//! anything can be in there. Sanitization never fails: unparsable input
//! degrades to the default User-Agent, and individual entries that could
//! not survive an HTTP header line are dropped.

use serde_json::Value;

/// Default User-Agent sent when a rule has no usable header set.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Normalize a raw JSON header blob into a safe-to-send header list.
///
/// - parse failure (or a non-object value) yields `[("User-Agent", <default>)]`
/// - keys are trimmed; empty or colon-containing keys are dropped
/// - values are coerced to trimmed strings
/// - surviving entries keep the input's insertion order
pub fn sanitize_headers(raw: Option<&str>) -> Vec<(String, String)> {
    let fallback = || vec![("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())];

    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return fallback(),
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return fallback(),
    };
    let object = match parsed.as_object() {
        Some(o) => o,
        None => return fallback(),
    };

    let mut headers = Vec::with_capacity(object.len());
    for (key, value) in object {
        let key = key.trim();
        if key.is_empty() || key.contains(':') {
            continue;
        }
        let value = match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        };
        headers.push((key.to_string(), value));
    }
    headers
}
