use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::api::Backend;
use crate::report::ReportConfig;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Daemon state: nothing works until `backend.select` points at the
/// school server, mirroring how the UI cannot render before login. The
/// session is shared with the token-refresh timer thread.
pub struct AppState {
    pub backend: Option<Arc<dyn Backend>>,
    pub session: Arc<Mutex<Session>>,
    pub report_config: ReportConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            backend: None,
            session: Arc::new(Mutex::new(Session::default())),
            report_config: ReportConfig::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
