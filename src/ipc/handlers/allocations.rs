use serde_json::json;

use super::{backend, bearer, required_i64, required_str};
use crate::api::ApiCall;
use crate::ipc::error::{api_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match backend.call(ApiCall::get("/subjects").bearer(Some(token))) {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match backend.call(ApiCall::get("/admin/allocations").bearer(Some(token))) {
        Ok(allocations) => ok(&req.id, json!({ "allocations": allocations })),
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
    let teacher_id = match required_i64(req, "teacherId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let subject_id = match required_i64(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match backend.call(
        ApiCall::post(
            "/admin/allocations",
            json!({
                "teacher_id": teacher_id,
                "subject_id": subject_id,
                "division": division,
            }),
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
    let allocation_id = match required_i64(req, "allocationId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::delete(format!("/admin/allocations/{}", allocation_id)).bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "allocations.list" => Some(handle_list(state, req)),
        "allocations.create" => Some(handle_create(state, req)),
        "allocations.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
