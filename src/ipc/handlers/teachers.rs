use serde_json::json;

use super::{backend, bearer, optional_str, required_i64, required_str};
use crate::api::ApiCall;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;
use crate::validators;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match backend.call(ApiCall::get("/admin/teachers").bearer(Some(token))) {
        Ok(teachers) => ok(&req.id, json!({ "teachers": teachers })),
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
    let name = match required_str(req, "name") {
        Ok(v) => v,
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
    let email = optional_str(req, "email").unwrap_or_default();

    for (field, check) in [
        ("name", validators::required(&name)),
        ("userid", validators::required(&userid)),
        ("password", validators::password(&password)),
        ("email", validators::email(&email)),
    ] {
        if let Some(msg) = check {
            return err(&req.id, "bad_params", msg, Some(json!({ "field": field })));
        }
    }

    let mut body = json!({
        "name": name,
        "userid": userid,
        "password": password,
    });
    if !email.is_empty() {
        body["email"] = json!(email);
    }

    match backend.call(ApiCall::post("/admin/teachers", body).bearer(Some(token))) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let mut body = serde_json::Map::new();
    if let Some(name) = optional_str(req, "name") {
        if let Some(msg) = validators::required(&name) {
            return err(&req.id, "bad_params", msg, Some(json!({ "field": "name" })));
        }
        body.insert("name".to_string(), json!(name));
    }
    if let Some(email) = optional_str(req, "email") {
        if let Some(msg) = validators::email(&email) {
            return err(&req.id, "bad_params", msg, Some(json!({ "field": "email" })));
        }
        body.insert("email".to_string(), json!(email));
    }
    if let Some(active) = req.params.get("active").and_then(|v| v.as_bool()) {
        body.insert("active".to_string(), json!(active));
    }
    if body.is_empty() {
        return err(&req.id, "bad_params", "nothing to update", None);
    }

    match backend.call(
        ApiCall::put(
            format!("/admin/teachers/{}", teacher_id),
            serde_json::Value::Object(body),
        )
        .bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    match backend.call(
        ApiCall::delete(format!("/admin/teachers/{}", teacher_id)).bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(handle_list(state, req)),
        "teachers.create" => Some(handle_create(state, req)),
        "teachers.update" => Some(handle_update(state, req)),
        "teachers.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
