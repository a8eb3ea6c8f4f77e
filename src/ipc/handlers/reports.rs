use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use super::results::{fetch_division_results, results_route};
use super::{backend, bearer, required_str};
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::report::{self, ReportConfig};

fn handle_config(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.report_config))
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    match ReportConfig::load(&path) {
        Ok(cfg) => {
            state.report_config = cfg;
            info!(path = %path.display(), "report config loaded");
            ok(&req.id, json!(state.report_config))
        }
        Err(e) => err(
            &req.id,
            "config_load_failed",
            format!("{e:#}"),
            Some(json!({ "path": path.display().to_string() })),
        ),
    }
}

/// Printable statement of marks for one student.
fn handle_statement(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let results = match fetch_division_results(
        backend.as_ref(),
        token,
        path,
        &division,
        Some(&roll_no),
    ) {
        Ok(r) => r,
        Err(e) => return api_err(&req.id, &e),
    };
    let Some(result) = results.into_iter().find(|r| r.roll_no == roll_no) else {
        return err(
            &req.id,
            "not_found",
            format!("no result for roll {} in division {}", roll_no, division),
            None,
        );
    };

    let statement = report::build_statement(&state.report_config, &result);
    ok(&req.id, json!({ "statement": statement }))
}

/// Statements for every student of a division, in roll order, for batch
/// printing.
fn handle_batch_statements(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let results = match fetch_division_results(backend.as_ref(), token, path, &division, None) {
        Ok(r) => r,
        Err(e) => return api_err(&req.id, &e),
    };
    let statements: Vec<_> = results
        .iter()
        .map(|r| report::build_statement(&state.report_config, r))
        .collect();
    ok(
        &req.id,
        json!({
            "division": division,
            "count": statements.len(),
            "statements": statements,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.config" => Some(handle_config(state, req)),
        "reports.configLoad" => Some(handle_config_load(state, req)),
        "reports.statement" => Some(handle_statement(state, req)),
        "reports.batchStatements" => Some(handle_batch_statements(state, req)),
        _ => None,
    }
}
