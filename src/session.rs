use crate::api::{ApiCall, Backend};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Refresh this long before the token's `exp` claim.
const REFRESH_MARGIN_SECS: i64 = 60;
/// Longest the timer thread sleeps before re-checking that its session
/// is still the live one.
const WAKE_INTERVAL: Duration = Duration::from_secs(30);

/// Which credential a call should carry. Teacher-scoped calls prefer the
/// impersonation token while an admin is acting as a teacher; admin calls
/// always use the primary token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    Admin,
    Teacher,
}

/// In-memory session: the daemon never persists credentials. Shared with
/// the refresh timer thread behind a mutex.
#[derive(Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub impersonate_token: Option<String>,
    pub user: Option<Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub generation: u64,
}

impl Session {
    pub fn bearer_for(&self, scope: AuthScope) -> Option<String> {
        match scope {
            AuthScope::Admin => self.token.clone(),
            AuthScope::Teacher => self.impersonate_token.clone().or_else(|| self.token.clone()),
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.get("role"))
            .and_then(|v| v.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a (possibly refreshed) token and its decoded expiry.
    pub fn install_token(&mut self, token: String) {
        self.expires_at = token_expiry(&token);
        self.token = Some(token);
    }

    /// Drop all credentials. Bumping the generation retires any refresh
    /// timer spawned for the old session.
    pub fn clear(&mut self) {
        self.token = None;
        self.impersonate_token = None;
        self.user = None;
        self.expires_at = None;
        self.generation += 1;
    }
}

/// Best-effort decode of a JWT `exp` claim. The token is opaque to us
/// otherwise; a missing or unreadable claim just means no proactive
/// refresh gets scheduled.
pub fn token_expiry(jwt: &str) -> Option<DateTime<Utc>> {
    let payload = jwt.split('.').nth(1)?;
    let raw = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&raw).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

/// Singleton-per-login background refresh: sleeps until shortly before
/// expiry, then re-acquires the token. The thread exits as soon as the
/// session it was spawned for is logged out or replaced.
pub fn spawn_refresh_timer(backend: Arc<dyn Backend>, session: Arc<Mutex<Session>>) {
    let my_generation = match session.lock() {
        Ok(s) => s.generation,
        Err(_) => return,
    };

    thread::spawn(move || loop {
        let (token, expires_at) = {
            let Ok(s) = session.lock() else { return };
            if s.generation != my_generation {
                return;
            }
            let Some(token) = s.token.clone() else {
                return;
            };
            (token, s.expires_at)
        };

        let Some(expires_at) = expires_at else {
            debug!("token has no expiry claim, refresh timer idle");
            return;
        };

        let due = expires_at - ChronoDuration::seconds(REFRESH_MARGIN_SECS);
        let now = Utc::now();
        if due > now {
            let remaining = (due - now)
                .to_std()
                .unwrap_or(WAKE_INTERVAL)
                .min(WAKE_INTERVAL);
            thread::sleep(remaining);
            continue;
        }

        match backend.call(ApiCall::post("/auth/refresh", Value::Null).bearer(Some(token))) {
            Ok(resp) => {
                let Some(new_token) = resp.get("token").and_then(|v| v.as_str()) else {
                    warn!("refresh response carried no token, stopping timer");
                    return;
                };
                let Ok(mut s) = session.lock() else { return };
                if s.generation != my_generation {
                    return;
                }
                s.install_token(new_token.to_string());
                info!("auth token refreshed ahead of expiry");
            }
            Err(e) => {
                // Surfacing happens on the next user-initiated request.
                warn!(error = %e, "proactive token refresh failed");
                return;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn fake_jwt(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn expiry_decodes_from_exp_claim() {
        let jwt = fake_jwt(&serde_json::json!({ "sub": "t1", "exp": 1_900_000_000 }));
        let exp = token_expiry(&jwt).unwrap();
        assert_eq!(exp.timestamp(), 1_900_000_000);
    }

    #[test]
    fn expiry_absent_or_garbled_is_none() {
        assert_eq!(token_expiry("not-a-jwt"), None);
        let jwt = fake_jwt(&serde_json::json!({ "sub": "t1" }));
        assert_eq!(token_expiry(&jwt), None);
        assert_eq!(token_expiry("a.%%%.c"), None);
    }

    #[test]
    fn teacher_scope_prefers_impersonation() {
        let mut s = Session::default();
        s.install_token("primary".to_string());
        assert_eq!(s.bearer_for(AuthScope::Teacher).as_deref(), Some("primary"));

        s.impersonate_token = Some("acting".to_string());
        assert_eq!(s.bearer_for(AuthScope::Teacher).as_deref(), Some("acting"));
        assert_eq!(s.bearer_for(AuthScope::Admin).as_deref(), Some("primary"));
    }

    #[test]
    fn clear_bumps_generation_and_drops_tokens() {
        let mut s = Session::default();
        s.install_token("primary".to_string());
        s.impersonate_token = Some("acting".to_string());
        let gen = s.generation;
        s.clear();
        assert!(!s.is_authenticated());
        assert_eq!(s.impersonate_token, None);
        assert_eq!(s.generation, gen + 1);
    }
}
