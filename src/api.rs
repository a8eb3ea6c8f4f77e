use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Request timeout. Keeps the UI responsive while the school server
/// restarts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One backend request. Handlers build these; the transport (real or
/// stubbed in tests) executes them.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiCall {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, None)
    }

    fn new(method: HttpMethod, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
            bearer: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// User-facing failure of a backend call. No retry, no offline queue:
/// the message is surfaced as-is by the UI.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Server restarting, please login again")]
    Unreachable { detail: String },
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response from server")]
    BadPayload { detail: String },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unreachable { .. } => "backend_unreachable",
            ApiError::Status { .. } => "http_error",
            ApiError::BadPayload { .. } => "bad_payload",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Translate an HTTP status into the portal's user-readable message,
/// preferring the backend's own `error` string for everything that is
/// not a session/access/server failure.
pub fn status_message(status: u16, body_error: Option<&str>) -> String {
    match status {
        401 => "Session expired. Please login again.".to_string(),
        403 => "You do not have access".to_string(),
        500 => "Server error".to_string(),
        _ => body_error
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Request failed (HTTP {})", status)),
    }
}

/// Transport seam: the HTTP client in production, a stub in tests.
pub trait Backend: Send + Sync {
    fn call(&self, call: ApiCall) -> Result<Value, ApiError>;
    fn call_bytes(&self, call: ApiCall) -> Result<Vec<u8>, ApiError>;
    fn base_url(&self) -> &str;
}

pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn connect(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Unreachable {
                detail: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn send(&self, call: &ApiCall) -> Result<reqwest::blocking::Response, ApiError> {
        let url = format!("{}{}", self.base_url, call.path);
        let mut req = self.client.request(call.method.as_reqwest(), &url);

        let mut query = call.query.clone();
        if call.method == HttpMethod::Get {
            // Cache busting, safe across backend database switches.
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            query.push(("_t".to_string(), millis.to_string()));
        }
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(token) = &call.bearer {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &call.body {
            req = req.json(body);
        }

        let resp = req.send().map_err(|e| ApiError::Unreachable {
            detail: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_error = resp
                .json::<Value>()
                .ok()
                .as_ref()
                .and_then(|v| v.get("error"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            return Err(ApiError::Status {
                status,
                message: status_message(status, body_error.as_deref()),
            });
        }
        Ok(resp)
    }
}

impl Backend for HttpBackend {
    fn call(&self, call: ApiCall) -> Result<Value, ApiError> {
        let resp = self.send(&call)?;
        let text = resp.text().map_err(|e| ApiError::BadPayload {
            detail: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::BadPayload {
            detail: e.to_string(),
        })
    }

    fn call_bytes(&self, call: ApiCall) -> Result<Vec<u8>, ApiError> {
        let resp = self.send(&call)?;
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::BadPayload {
                detail: e.to_string(),
            })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_follow_portal_wording() {
        assert_eq!(status_message(401, None), "Session expired. Please login again.");
        assert_eq!(status_message(403, Some("ignored")), "You do not have access");
        assert_eq!(status_message(500, None), "Server error");
        assert_eq!(status_message(400, Some("entries (array) is required")),
            "entries (array) is required");
        assert_eq!(status_message(404, None), "Request failed (HTTP 404)");
    }

    #[test]
    fn error_display_is_the_user_message() {
        let e = ApiError::Unreachable { detail: "tcp".into() };
        assert_eq!(e.to_string(), "Server restarting, please login again");
        assert_eq!(e.code(), "backend_unreachable");

        let e = ApiError::Status { status: 401, message: status_message(401, None) };
        assert_eq!(e.to_string(), "Session expired. Please login again.");
        assert_eq!(e.status(), Some(401));
    }

    #[test]
    fn call_builder_collects_query_and_bearer() {
        let call = ApiCall::get("/admin/results")
            .query("division", "A")
            .bearer(Some("tok".into()));
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.query, vec![("division".to_string(), "A".to_string())]);
        assert_eq!(call.bearer.as_deref(), Some("tok"));
        assert!(call.body.is_none());
    }
}
