use serde_json::json;

use super::{backend, bearer, required_str, sort_rows_by_roll};
use crate::api::ApiCall;
use crate::calc::{self, SubjectMarks};
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthScope;

fn subject_param(req: &Request) -> Result<String, serde_json::Value> {
    // Subject may arrive as a numeric id or a code string; the backend
    // accepts both.
    match req.params.get("subjectId") {
        Some(v) if v.is_i64() => Ok(v.to_string()),
        Some(v) if v.is_string() => Ok(v.as_str().unwrap_or_default().to_string()),
        _ => Err(err(&req.id, "bad_params", "missing subjectId", None)),
    }
}

fn handle_marks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let subject_id = match subject_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::get("/teacher/marks")
            .query("subject_id", subject_id)
            .query("division", division)
            .bearer(Some(token)),
    ) {
        Ok(resp) => {
            let mut rows = resp.as_array().cloned().unwrap_or_default();
            sort_rows_by_roll(&mut rows);
            ok(&req.id, json!({ "rows": rows }))
        }
        Err(e) => api_err(&req.id, &e),
    }
}

/// Batch upsert of component marks. Every entry is bounds-checked here
/// before anything is sent: a single bad cell rejects the whole batch so
/// the teacher can fix it in place.
fn handle_marks_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let subject_id = match subject_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(entries) = req.params.get("entries").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "entries (array) is required", None);
    };
    if entries.is_empty() {
        return err(&req.id, "bad_params", "entries must not be empty", None);
    }

    let mut wire_entries = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let Some(roll_no) = entry.get("rollNo").and_then(|v| v.as_str()) else {
            return err(
                &req.id,
                "bad_params",
                format!("entry {} missing rollNo", idx + 1),
                None,
            );
        };
        let field = |key: &str| entry.get(key).and_then(|v| v.as_f64());
        let marks = SubjectMarks {
            unit1: field("unit1"),
            unit2: field("unit2"),
            term: field("term"),
            annual: field("annual"),
            internal: field("internal"),
        };
        if let Err(bounds) = marks.validate() {
            return err(
                &req.id,
                "bad_params",
                bounds.to_string(),
                Some(json!({
                    "rollNo": roll_no,
                    "field": bounds.field,
                    "value": bounds.value,
                    "max": bounds.max,
                })),
            );
        }
        wire_entries.push(json!({
            "roll_no": roll_no,
            "division": division,
            "subject_id": subject_id,
            "unit1": marks.unit1,
            "unit2": marks.unit2,
            "term": marks.term,
            "annual": marks.annual,
            "internal": marks.internal,
        }));
    }

    match backend.call(
        ApiCall::post("/teacher/marks/batch", json!({ "entries": wire_entries }))
            .bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let subject_code = match required_str(req, "subjectCode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backend.call(
        ApiCall::get("/teacher/grades")
            .query("subject_code", subject_code)
            .query("division", division)
            .bearer(Some(token)),
    ) {
        Ok(resp) => {
            let mut rows = resp.as_array().cloned().unwrap_or_default();
            sort_rows_by_roll(&mut rows);
            ok(&req.id, json!({ "rows": rows }))
        }
        Err(e) => api_err(&req.id, &e),
    }
}

/// Letter-grade entry for the GRADE subjects (EVS / PE).
fn handle_grades_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = match backend(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let token = match bearer(state, req, AuthScope::Teacher) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let subject_code = match required_str(req, "subjectCode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let division = match required_str(req, "division") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if !crate::subjects::is_grade_subject(&subject_code) {
        return err(
            &req.id,
            "bad_params",
            format!("{} is not a grade-only subject", subject_code),
            None,
        );
    }
    let Some(entries) = req.params.get("entries").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "entries (array) is required", None);
    };
    if entries.is_empty() {
        return err(&req.id, "bad_params", "entries must not be empty", None);
    }

    let mut wire_entries = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let Some(roll_no) = entry.get("rollNo").and_then(|v| v.as_str()) else {
            return err(
                &req.id,
                "bad_params",
                format!("entry {} missing rollNo", idx + 1),
                None,
            );
        };
        let Some(grade) = entry.get("grade").and_then(|v| v.as_str()) else {
            return err(
                &req.id,
                "bad_params",
                format!("entry {} missing grade", idx + 1),
                None,
            );
        };
        if !calc::is_valid_grade_code(grade) {
            return err(
                &req.id,
                "bad_params",
                format!("invalid grade {:?}", grade),
                Some(json!({ "rollNo": roll_no, "allowed": calc::GRADE_CODES })),
            );
        }
        wire_entries.push(json!({
            "roll_no": roll_no,
            "division": division,
            "grade": grade.to_ascii_uppercase(),
        }));
    }

    match backend.call(
        ApiCall::post(
            "/teacher/grades",
            json!({ "subject_code": subject_code, "entries": wire_entries }),
        )
        .bearer(Some(token)),
    ) {
        Ok(result) => ok(&req.id, result),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.list" => Some(handle_marks_list(state, req)),
        "marks.save" => Some(handle_marks_save(state, req)),
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.save" => Some(handle_grades_save(state, req)),
        _ => None,
    }
}
