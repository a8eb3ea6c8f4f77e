pub mod allocations;
pub mod batches;
pub mod core;
pub mod marks;
pub mod reports;
pub mod results;
pub mod session;
pub mod students;
pub mod teachers;

use std::sync::Arc;

use crate::api::Backend;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;
use crate::subjects;

pub(super) fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub(super) fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub(super) fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub(super) fn backend(
    state: &AppState,
    req: &Request,
) -> Result<Arc<dyn Backend>, serde_json::Value> {
    state
        .backend
        .clone()
        .ok_or_else(|| err(&req.id, "no_backend", "select a backend first", None))
}

/// Bearer token for the given scope, or the standard not-logged-in error.
pub(super) fn bearer(
    state: &AppState,
    req: &Request,
    scope: AuthScope,
) -> Result<String, serde_json::Value> {
    let token = state
        .session
        .lock()
        .ok()
        .and_then(|s| s.bearer_for(scope));
    token.ok_or_else(|| err(&req.id, "not_authenticated", "login first", None))
}

// Some backend revisions send roll numbers as bare integers.
fn roll_of(row: &serde_json::Value) -> String {
    match row.get("roll_no") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Natural roll-number sort over raw backend rows.
pub(super) fn sort_rows_by_roll(rows: &mut [serde_json::Value]) {
    rows.sort_by(|a, b| subjects::compare_rolls(&roll_of(a), &roll_of(b)));
}
