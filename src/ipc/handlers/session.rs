use serde_json::json;
use tracing::{debug, info};

use super::{backend, bearer, required_i64, required_str};
use crate::api::ApiCall;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{spawn_refresh_timer, AuthScope};
use crate::validators;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let userid = match required_str(req, "userid") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    for (field, value) in [("userid", &userid), ("password", &password)] {
        if let Some(msg) = validators::required(value) {
            return err(&req.id, "bad_params", msg, Some(json!({ "field": field })));
        }
    }

    let resp = match backend.call(ApiCall::post(
        "/auth/login",
        json!({ "userid": userid, "password": password }),
    )) {
        Ok(v) => v,
        Err(e) => return api_err(&req.id, &e),
    };
    let Some(token) = resp.get("token").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_payload", "login response carried no token", None);
    };

    {
        let Ok(mut s) = state.session.lock() else {
            return err(&req.id, "internal", "session lock poisoned", None);
        };
        s.clear();
        s.install_token(token.to_string());
    }

    // The login response may already carry the user; /auth/me is the
    // authoritative shape either way.
    let me = backend
        .call(ApiCall::get("/auth/me").bearer(Some(token.to_string())))
        .ok()
        .or_else(|| resp.get("user").cloned());
    let expires_at = {
        let Ok(mut s) = state.session.lock() else {
            return err(&req.id, "internal", "session lock poisoned", None);
        };
        s.user = me.clone();
        s.expires_at
    };

    spawn_refresh_timer(backend, state.session.clone());
    info!(userid = %userid, "logged in");

    ok(
        &req.id,
        json!({
            "user": me,
            "expiresAt": expires_at.map(|t| t.to_rfc3339()),
        }),
    )
}

fn handle_me(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match backend.call(ApiCall::get("/auth/me").bearer(Some(token))) {
        Ok(user) => {
            if let Ok(mut s) = state.session.lock() {
                s.user = Some(user.clone());
            }
            ok(&req.id, user)
        }
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let resp = match backend.call(ApiCall::post("/auth/refresh", serde_json::Value::Null).bearer(Some(token))) {
        Ok(v) => v,
        Err(e) => return api_err(&req.id, &e),
    };
    let Some(new_token) = resp.get("token").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_payload", "refresh response carried no token", None);
    };
    let expires_at = {
        let Ok(mut s) = state.session.lock() else {
            return err(&req.id, "internal", "session lock poisoned", None);
        };
        s.install_token(new_token.to_string());
        s.expires_at
    };
    ok(
        &req.id,
        json!({ "expiresAt": expires_at.map(|t| t.to_rfc3339()) }),
    )
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Server-side logout is best effort; the backend may be restarting.
    if let (Ok(backend), Ok(token)) = (
        backend(state, req),
        bearer(state, req, AuthScope::Admin),
    ) {
        if let Err(e) = backend.call(ApiCall::post("/auth/logout", serde_json::Value::Null).bearer(Some(token))) {
            debug!(error = %e, "server-side logout skipped");
        }
    }
    if let Ok(mut s) = state.session.lock() {
        s.clear();
    }
    ok(&req.id, json!({ "loggedOut": true }))
}

fn handle_change_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let old_password = match required_str(req, "oldPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let new_password = match required_str(req, "newPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let confirm_password = match required_str(req, "confirmPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if let Some(msg) = validators::password(&new_password) {
        return err(&req.id, "bad_params", msg, Some(json!({ "field": "newPassword" })));
    }
    if let Some(msg) = validators::matches(&new_password, "New password", &confirm_password) {
        return err(&req.id, "bad_params", msg, Some(json!({ "field": "confirmPassword" })));
    }

    match backend.call(
        ApiCall::put(
            "/teacher/password",
            json!({
                "old_password": old_password,
                "new_password": new_password,
                "confirm_password": confirm_password,
            }),
        )
        .bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_impersonate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let teacher_id = match required_i64(req, "teacherId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let resp = match backend.call(
        ApiCall::post(
            format!("/admin/teachers/{}/impersonate", teacher_id),
            serde_json::Value::Null,
        )
        .bearer(Some(token)),
    ) {
        Ok(v) => v,
        Err(e) => return api_err(&req.id, &e),
    };
    let Some(acting_token) = resp.get("token").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_payload", "impersonate response carried no token", None);
    };
    if let Ok(mut s) = state.session.lock() {
        s.impersonate_token = Some(acting_token.to_string());
    }
    info!(teacher_id, "impersonation started");
    ok(&req.id, json!({ "impersonating": true, "teacherId": teacher_id }))
}

fn handle_impersonate_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Ok(mut s) = state.session.lock() {
        s.impersonate_token = None;
    }
    ok(&req.id, json!({ "impersonating": false }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.me" => Some(handle_me(state, req)),
        "auth.refresh" => Some(handle_refresh(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.changePassword" => Some(handle_change_password(state, req)),
        "admin.impersonate" => Some(handle_impersonate(state, req)),
        "admin.impersonateClear" => Some(handle_impersonate_clear(state, req)),
        _ => None,
    }
}
