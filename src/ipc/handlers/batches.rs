use serde_json::json;
use tracing::info;

use super::{backend, bearer, required_str};
use crate::api::ApiCall;
use crate::ipc::error::{api_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match backend.call(ApiCall::get("/admin/batches").bearer(Some(token))) {
        Ok(batches) => ok(&req.id, batches),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let batch_id = match required_str(req, "batchId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::post("/admin/batches/create", json!({ "batch_id": batch_id }))
            .bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

/// The backend owns the active-batch selection; every later query runs
/// against the batch switched to here.
fn handle_switch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let batch_id = match required_str(req, "batchId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::post("/admin/batches/switch", json!({ "batch_id": batch_id }))
            .bearer(Some(token)),
    ) {
        Ok(result) => {
            info!(batch = %batch_id, "active batch switched");
            ok(&req.id, result)
        }
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "batches.list" => Some(handle_list(state, req)),
        "batches.create" => Some(handle_create(state, req)),
        "batches.switch" => Some(handle_switch(state, req)),
        _ => None,
    }
}
