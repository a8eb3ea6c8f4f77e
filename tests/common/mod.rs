#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use resultd::api::{ApiCall, ApiError, Backend};
use resultd::ipc::{self, AppState, Request};
use serde_json::{json, Value};

type Responder = Box<dyn Fn(&ApiCall) -> Result<Value, ApiError> + Send + Sync>;

/// In-process stand-in for the school REST backend. Records every call
/// so tests can assert on paths, bodies and bearer tokens.
pub struct StubBackend {
    pub calls: Mutex<Vec<ApiCall>>,
    responder: Responder,
}

impl StubBackend {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ApiCall) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    pub fn recorded(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("stub lock").clone()
    }

    pub fn last_call_to(&self, path: &str) -> Option<ApiCall> {
        self.recorded()
            .into_iter()
            .rev()
            .find(|c| c.path == path)
    }
}

impl Backend for StubBackend {
    fn call(&self, call: ApiCall) -> Result<Value, ApiError> {
        self.calls.lock().expect("stub lock").push(call.clone());
        (self.responder)(&call)
    }

    fn call_bytes(&self, call: ApiCall) -> Result<Vec<u8>, ApiError> {
        self.calls.lock().expect("stub lock").push(call.clone());
        (self.responder)(&call).map(|v| match v {
            Value::String(s) => s.into_bytes(),
            other => other.to_string().into_bytes(),
        })
    }

    fn base_url(&self) -> &str {
        "http://stub"
    }
}

pub fn state_with(stub: Arc<StubBackend>) -> AppState {
    let mut state = AppState::new();
    state.backend = Some(stub);
    state
}

/// Install a session directly, as if `auth.login` had succeeded.
pub fn force_login(state: &AppState, token: &str, role: &str) {
    let mut s = state.session.lock().expect("session lock");
    s.install_token(token.to_string());
    s.user = Some(json!({ "role": role, "userid": "test-user" }));
}

pub fn request(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    ipc::handle_request(
        state,
        Request {
            id: id.to_string(),
            method: method.to_string(),
            params,
        },
    )
}

pub fn expect_ok(resp: &Value, method: &str) -> Value {
    assert!(
        resp.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        resp
    );
    resp.get("result").cloned().unwrap_or_else(|| json!({}))
}

pub fn expect_err(resp: &Value, code: &str) -> Value {
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected error, got: {}",
        resp
    );
    let error = resp.get("error").cloned().expect("error object");
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some(code),
        "unexpected error code in: {}",
        error
    );
    error
}
