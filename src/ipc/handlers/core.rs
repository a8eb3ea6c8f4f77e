use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::required_str;
use crate::api::{Backend, HttpBackend};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (authenticated, role) = state
        .session
        .lock()
        .map(|s| (s.is_authenticated(), s.role().map(|r| r.to_string())))
        .unwrap_or((false, None));
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backendUrl": state.backend.as_ref().map(|b| b.base_url().to_string()),
            "authenticated": authenticated,
            "role": role,
        }),
    )
}

fn handle_backend_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = match required_str(req, "baseUrl") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if base_url.trim().is_empty() {
        return err(&req.id, "bad_params", "baseUrl must not be empty", None);
    }

    match HttpBackend::connect(&base_url) {
        Ok(backend) => {
            let url = backend.base_url().to_string();
            state.backend = Some(Arc::new(backend));
            // A new backend means a new session; drop stale credentials.
            if let Ok(mut s) = state.session.lock() {
                s.clear();
            }
            info!(backend = %url, "backend selected");
            ok(&req.id, json!({ "backendUrl": url }))
        }
        Err(e) => err(&req.id, "backend_connect_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "backend.select" => Some(handle_backend_select(state, req)),
        _ => None,
    }
}
