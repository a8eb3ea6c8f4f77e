mod common;

use common::{expect_err, expect_ok, force_login, request, state_with, StubBackend};
use serde_json::json;

#[test]
fn marks_save_posts_snake_case_batch() {
    let stub = StubBackend::new(|call| match call.path.as_str() {
        "/teacher/marks/batch" => Ok(json!({ "saved": 2 })),
        other => panic!("unexpected call: {}", other),
    });
    let mut state = state_with(stub.clone());
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "marks.save",
        json!({
            "subjectId": 4,
            "division": "A",
            "entries": [
                { "rollNo": "1", "unit1": 20, "unit2": 18, "term": 35, "annual": 60, "internal": 15 },
                { "rollNo": "2", "unit1": 22.5, "term": 40 },
            ],
        }),
    );
    let result = expect_ok(&resp, "marks.save");
    assert_eq!(result["saved"], 2);

    let call = stub.last_call_to("/teacher/marks/batch").unwrap();
    let entries = call.body.as_ref().unwrap()["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["roll_no"], "1");
    assert_eq!(entries[0]["division"], "A");
    assert_eq!(entries[0]["subject_id"], "4");
    assert_eq!(entries[0]["unit1"], 20.0);
    assert_eq!(entries[1]["roll_no"], "2");
    // Absent components stay null rather than defaulting to zero.
    assert!(entries[1]["annual"].is_null());
    assert!(entries[1]["internal"].is_null());
}

#[test]
fn one_out_of_bounds_cell_rejects_the_whole_batch() {
    let stub = StubBackend::new(|call| panic!("unexpected call: {}", call.path));
    let mut state = state_with(stub.clone());
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "marks.save",
        json!({
            "subjectId": 4,
            "division": "A",
            "entries": [
                { "rollNo": "1", "unit1": 20 },
                { "rollNo": "2", "unit1": 26 },
            ],
        }),
    );
    let error = expect_err(&resp, "bad_params");
    assert_eq!(error["details"]["rollNo"], "2");
    assert_eq!(error["details"]["field"], "unit1");
    assert_eq!(error["details"]["value"], 26.0);
    assert_eq!(error["details"]["max"], 25.0);
    assert!(stub.recorded().is_empty());
}

#[test]
fn marks_save_requires_entries() {
    let stub = StubBackend::new(|call| panic!("unexpected call: {}", call.path));
    let mut state = state_with(stub);
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "marks.save",
        json!({ "subjectId": 4, "division": "A" }),
    );
    expect_err(&resp, "bad_params");

    let resp = request(
        &mut state,
        "2",
        "marks.save",
        json!({ "subjectId": 4, "division": "A", "entries": [] }),
    );
    let error = expect_err(&resp, "bad_params");
    assert_eq!(error["message"], "entries must not be empty");
}

#[test]
fn marks_list_sorts_rows_naturally() {
    let stub = StubBackend::new(|call| match call.path.as_str() {
        "/teacher/marks" => Ok(json!([
            { "roll_no": "10", "unit1": 20 },
            { "roll_no": "2", "unit1": 18 },
            { "roll_no": 3, "unit1": 15 },
        ])),
        other => panic!("unexpected call: {}", other),
    });
    let mut state = state_with(stub);
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "marks.list",
        json!({ "subjectId": "4", "division": "A" }),
    );
    let result = expect_ok(&resp, "marks.list");
    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows[0]["roll_no"], "2");
    assert_eq!(rows[1]["roll_no"], 3);
    assert_eq!(rows[2]["roll_no"], "10");
}

#[test]
fn grades_save_normalizes_and_validates_grades() {
    let stub = StubBackend::new(|call| match call.path.as_str() {
        "/teacher/grades" => Ok(json!({ "saved": 1 })),
        other => panic!("unexpected call: {}", other),
    });
    let mut state = state_with(stub.clone());
    force_login(&state, "tok", "TEACHER");

    // Lowercase input goes out uppercased.
    let resp = request(
        &mut state,
        "1",
        "grades.save",
        json!({
            "subjectCode": "EVS",
            "division": "A",
            "entries": [ { "rollNo": "1", "grade": "a" } ],
        }),
    );
    expect_ok(&resp, "grades.save");
    let call = stub.last_call_to("/teacher/grades").unwrap();
    let body = call.body.as_ref().unwrap();
    assert_eq!(body["subject_code"], "EVS");
    assert_eq!(body["entries"][0]["grade"], "A");
    assert_eq!(body["entries"][0]["division"], "A");

    // Unknown letter is rejected locally.
    let before = stub.recorded().len();
    let resp = request(
        &mut state,
        "2",
        "grades.save",
        json!({
            "subjectCode": "PE",
            "division": "A",
            "entries": [ { "rollNo": "1", "grade": "Z" } ],
        }),
    );
    let error = expect_err(&resp, "bad_params");
    assert_eq!(error["details"]["rollNo"], "1");
    assert_eq!(stub.recorded().len(), before);
}

#[test]
fn grades_save_requires_entries() {
    let stub = StubBackend::new(|call| panic!("unexpected call: {}", call.path));
    let mut state = state_with(stub);
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "grades.save",
        json!({ "subjectCode": "EVS", "division": "A" }),
    );
    expect_err(&resp, "bad_params");

    let resp = request(
        &mut state,
        "2",
        "grades.save",
        json!({ "subjectCode": "EVS", "division": "A", "entries": [] }),
    );
    let error = expect_err(&resp, "bad_params");
    assert_eq!(error["message"], "entries must not be empty");
}

#[test]
fn grades_save_refuses_mark_subjects() {
    let stub = StubBackend::new(|call| panic!("unexpected call: {}", call.path));
    let mut state = state_with(stub);
    force_login(&state, "tok", "TEACHER");

    let resp = request(
        &mut state,
        "1",
        "grades.save",
        json!({
            "subjectCode": "ENG",
            "division": "A",
            "entries": [ { "rollNo": "1", "grade": "A" } ],
        }),
    );
    let error = expect_err(&resp, "bad_params");
    assert!(error["message"].as_str().unwrap().contains("ENG"));
}
