use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn roundtrip(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

#[test]
fn health_reports_unauthenticated_startup_state() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let resp = roundtrip(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(resp["ok"], true);
    assert!(resp["result"]["version"].is_string());
    assert_eq!(resp["result"]["authenticated"], false);
    assert!(resp["result"]["backendUrl"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn requests_fail_cleanly_before_backend_selection() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let resp = roundtrip(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "userid": "a", "password": "b" }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "no_backend");

    let resp = roundtrip(&mut stdin, &mut reader, "2", "backend.select", json!({}));
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_methods_and_bad_json_get_error_frames() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let resp = roundtrip(&mut stdin, &mut reader, "1", "definitely.not.a.method", json!({}));
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "not_implemented");

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read error line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse error frame");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "bad_json");

    // The daemon keeps serving after a garbled line.
    let resp = roundtrip(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(resp["ok"], true);

    drop(stdin);
    let _ = child.wait();
}
