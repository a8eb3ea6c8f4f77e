use serde_json::json;

use super::{backend, bearer, optional_str, required_str, sort_rows_by_roll};
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
    let mut call = ApiCall::get("/admin/students").bearer(Some(token));
    if let Some(division) = optional_str(req, "division") {
        call = call.query("division", division);
    }
    if let Some(search) = optional_str(req, "search") {
        call = call.query("search", search);
    }
    match backend.call(call) {
        Ok(resp) => {
            // Backend may page ({students: [..]}) or return a bare array.
            let mut rows = resp
                .get("students")
                .and_then(|v| v.as_array())
                .or_else(|| resp.as_array())
                .cloned()
                .unwrap_or_default();
            sort_rows_by_roll(&mut rows);
            ok(&req.id, json!({ "students": rows }))
        }
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
    let roll_no = match required_str(req, "rollNo") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    for (field, value) in [("rollNo", &roll_no), ("name", &name), ("division", &division)] {
        if let Some(msg) = validators::required(value) {
            return err(&req.id, "bad_params", msg, Some(json!({ "field": field })));
        }
    }

    let mut body = json!({
        "roll_no": roll_no,
        "name": name,
        "division": division,
    });
    if let Some(optional) = optional_str(req, "optionalSubject") {
        body["optional_subject"] = json!(optional);
    }
    if let Some(optional2) = optional_str(req, "optionalSubject2") {
        body["optional_subject_2"] = json!(optional2);
    }

    match backend.call(ApiCall::post("/admin/students", body).bearer(Some(token))) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_division(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::get("/teacher/students-by-division")
            .query("division", division)
            .bearer(Some(token)),
    ) {
        Ok(resp) => {
            let mut rows = resp.as_array().cloned().unwrap_or_default();
            sort_rows_by_roll(&mut rows);
            ok(&req.id, json!({ "students": rows }))
        }
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.byDivision" => Some(handle_by_division(state, req)),
        _ => None,
    }
}
