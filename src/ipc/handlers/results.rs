use serde_json::json;
use tracing::info;

use super::{backend, bearer, optional_str, required_str};
use crate::api::{ApiCall, ApiError, Backend};
use crate::calc::{self, StudentResult};
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;
use crate::subjects;

/// A teacher session, or an admin acting as one, gets the teacher-scoped
/// routes; the backend checks the allocation.
fn teacher_view(state: &AppState) -> bool {
    state
        .session
        .lock()
        .map(|s| s.role() == Some("TEACHER") || s.impersonate_token.is_some())
        .unwrap_or(false)
}

/// Consolidated results live on two routes: admins query any division,
/// teachers only the ones they are allocated.
pub(super) fn results_route(state: &AppState) -> (AuthScope, &'static str) {
    if teacher_view(state) {
        (AuthScope::Teacher, "/teacher/complete-table")
    } else {
        (AuthScope::Admin, "/admin/results")
    }
}

fn handle_divisions(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    // Teachers see only the divisions they are allocated; admins see all.
    let (scope, path) = if teacher_view(state) {
        (AuthScope::Teacher, "/teacher/divisions")
    } else {
        (AuthScope::Admin, "/admin/divisions")
    };
    let token = match bearer(state, req, scope) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let mut call = ApiCall::get(path).bearer(Some(token));
    if let Some(subject_id) = optional_str(req, "subjectId") {
        call = call.query("subject_id", subject_id);
    }
    match backend.call(call) {
        Ok(divisions) => ok(&req.id, json!({ "divisions": divisions })),
        Err(e) => api_err(&req.id, &e),
    }
}

/// Fetch and decode the consolidated results of one division, sorted in
/// natural roll order. Rows missing an overall letter grade get it derived
/// from the percentage here, once, instead of in every consuming view.
pub(super) fn fetch_division_results(
    backend: &dyn Backend,
    token: String,
    path: &str,
    division: &str,
    roll_no: Option<&str>,
) -> Result<Vec<StudentResult>, ApiError> {
    let mut call = ApiCall::get(path)
        .query("division", division)
        .bearer(Some(token));
    if let Some(roll) = roll_no {
        call = call.query("roll_no", roll);
    }
    let resp = backend.call(call)?;

    // A roll-number query may return a single object instead of a list.
    let mut results: Vec<StudentResult> = if resp.is_array() {
        serde_json::from_value(resp).map_err(|e| ApiError::BadPayload {
            detail: e.to_string(),
        })?
    } else if resp.is_object() {
        vec![serde_json::from_value(resp).map_err(|e| ApiError::BadPayload {
            detail: e.to_string(),
        })?]
    } else {
        Vec::new()
    };

    for r in &mut results {
        if r.grade.is_none() {
            r.grade = r
                .percentage
                .map(|p| calc::grade_for_percentage(p).to_string());
        }
    }
    results.sort_by(|a, b| subjects::compare_rolls(&a.roll_no, &b.roll_no));
    Ok(results)
}

fn handle_division_results(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let (scope, path) = results_route(state);
    let token = match bearer(state, req, scope) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match fetch_division_results(backend.as_ref(), token, path, &division, None) {
        Ok(results) => ok(
            &req.id,
            json!({ "division": division, "results": results }),
        ),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_student_result(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let (scope, path) = results_route(state);
    let token = match bearer(state, req, scope) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let roll_no = match required_str(req, "rollNo") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match fetch_division_results(backend.as_ref(), token, path, &division, Some(&roll_no)) {
        Ok(results) => match results.into_iter().find(|r| r.roll_no == roll_no) {
            Some(result) => ok(&req.id, json!({ "result": result })),
            None => err(
                &req.id,
                "not_found",
                format!("no result for roll {} in division {}", roll_no, division),
                None,
            ),
        },
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::post("/admin/results/generate", json!({ "division": division }))
            .bearer(Some(token)),
    ) {
        Ok(result) => {
            info!(division = %division, "results regenerated");
            ok(&req.id, result)
        }
        Err(e) => api_err(&req.id, &e),
    }
}

/// Download the backend-produced XLSX for a division. Generation stays
/// server-side; this only streams bytes to disk.
fn handle_export_excel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Admin) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let bytes = match backend.call_bytes(
        ApiCall::get("/admin/results/export-excel")
            .query("division", &division)
            .bearer(Some(token)),
    ) {
        Ok(b) => b,
        Err(e) => return api_err(&req.id, &e),
    };

    if let Err(e) = std::fs::write(&out_path, &bytes) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path })),
        );
    }
    ok(
        &req.id,
        json!({ "path": out_path, "bytes": bytes.len() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "divisions.list" => Some(handle_divisions(state, req)),
        "results.division" => Some(handle_division_results(state, req)),
        "results.student" => Some(handle_student_result(state, req)),
        "results.generate" => Some(handle_generate(state, req)),
        "results.exportExcel" => Some(handle_export_excel(state, req)),
        _ => None,
    }
}
