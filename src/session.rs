//! Server-side sessions keyed by an opaque cookie token, plus the login-view settings.

use crate::config::Settings;
use crate::error::AppError;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const SESSION_COOKIE: &str = "session";
/// Header carrying the CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub csrf_token: String,
    pub user_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Where unauthenticated users are sent and what they are told.
#[derive(Clone, Debug)]
pub struct LoginManager {
    pub login_view: &'static str,
    pub login_message: &'static str,
    pub login_message_category: &'static str,
}

impl Default for LoginManager {
    fn default() -> Self {
        LoginManager {
            login_view: "/auth/login",
            login_message: "Please log in to access this page.",
            login_message_category: "info",
        }
    }
}

impl LoginManager {
    pub fn unauthorized(&self) -> AppError {
        AppError::Unauthorized {
            code: "unauthorized",
            message: self.login_message.to_string(),
            details: Some(serde_json::json!({
                "login_url": self.login_view,
                "category": self.login_message_category,
            })),
        }
    }
}

/// Upper bound on live sessions held by one instance.
pub const MAX_SESSIONS: usize = 100_000;

/// Per-instance session table. Clones share the table; separate instances never do.
///
/// Expired entries are swept on every insert. When the table is still full, the
/// session closest to expiry is evicted, anonymous sessions first.
#[derive(Clone)]
pub struct SessionStore {
    by_token: Arc<RwLock<HashMap<String, Session>>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SessionStore {
            by_token: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Start an anonymous session that expires after the configured lifetime.
    pub fn create(&self, settings: &Settings) -> Result<Session, AppError> {
        let session = Session {
            token: new_token(),
            csrf_token: new_token(),
            user_id: None,
            expires_at: Utc::now() + settings.permanent_session_lifetime,
        };
        let mut guard = self.write()?;
        make_room(&mut guard, self.capacity);
        guard.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    /// Live session for `token`; expired entries are dropped on the way.
    pub fn get(&self, token: &str) -> Result<Option<Session>, AppError> {
        let now = Utc::now();
        let found = self
            .by_token
            .read()
            .map_err(|_| lock_error())?
            .get(token)
            .cloned();
        match found {
            Some(s) if s.expires_at > now => Ok(Some(s)),
            Some(_) => {
                self.write()?.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Bind a user to the session under a fresh token (fixation guard). Returns the new session.
    pub fn login(
        &self,
        previous: Option<&str>,
        user_id: &str,
        settings: &Settings,
    ) -> Result<Session, AppError> {
        let mut guard = self.write()?;
        if let Some(old) = previous {
            guard.remove(old);
        }
        let session = Session {
            token: new_token(),
            csrf_token: new_token(),
            user_id: Some(user_id.to_string()),
            expires_at: Utc::now() + settings.permanent_session_lifetime,
        };
        make_room(&mut guard, self.capacity);
        guard.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    pub fn remove(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.write()?.remove(token).is_some())
    }

    pub fn len(&self) -> usize {
        self.by_token.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Session>>, AppError> {
        self.by_token.write().map_err(|_| lock_error())
    }
}

fn make_room(table: &mut HashMap<String, Session>, capacity: usize) {
    let now = Utc::now();
    table.retain(|_, s| s.expires_at > now);
    while table.len() >= capacity {
        let victim = table
            .values()
            .min_by_key(|s| (s.user_id.is_some(), s.expires_at))
            .map(|s| s.token.clone());
        match victim {
            Some(token) => {
                table.remove(&token);
                tracing::debug!("session table full, evicted oldest session");
            }
            None => break,
        }
    }
}

fn lock_error() -> AppError {
    AppError::Internal("session lock poisoned".into())
}

/// Session token from the `Cookie` header, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for a live session, honouring the profile's cookie policy.
pub fn session_cookie(settings: &Settings, session: &Session) -> String {
    let max_age = settings.permanent_session_lifetime.num_seconds();
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite={}",
        SESSION_COOKIE,
        session.token,
        max_age,
        settings.session_cookie_samesite.as_str()
    );
    if settings.session_cookie_httponly {
        cookie.push_str("; HttpOnly");
    }
    if settings.session_cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie(settings: &Settings) -> String {
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; SameSite={}",
        SESSION_COOKIE,
        settings.session_cookie_samesite.as_str()
    );
    if settings.session_cookie_httponly {
        cookie.push_str("; HttpOnly");
    }
    if settings.session_cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigRegistry;
    use axum::http::HeaderValue;

    fn settings(profile: &str) -> Settings {
        ConfigRegistry::standard().select(profile, |_| None).unwrap()
    }

    #[test]
    fn reads_session_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert!(token_from_headers(&empty).is_none());
    }

    #[test]
    fn production_cookie_is_secure() {
        let s = settings("production");
        let session = SessionStore::new().create(&s).unwrap();
        let cookie = session_cookie(&s, &session);
        assert!(cookie.starts_with(&format!("session={}", session.token)));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        let dev_cookie = session_cookie(&settings("development"), &session);
        assert!(!dev_cookie.contains("Secure"));
    }

    #[test]
    fn login_rotates_the_token() {
        let s = settings("testing");
        let store = SessionStore::new();
        let anon = store.create(&s).unwrap();
        let authed = store.login(Some(&anon.token), "user-1", &s).unwrap();
        assert_ne!(anon.token, authed.token);
        assert!(store.get(&anon.token).unwrap().is_none());
        let loaded = store.get(&authed.token).unwrap().unwrap();
        assert_eq!(loaded.user_id.as_deref(), Some("user-1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let mut s = settings("testing");
        s.permanent_session_lifetime = chrono::Duration::seconds(-1);
        let store = SessionStore::new();
        let session = store.create(&s).unwrap();
        assert!(store.get(&session.token).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn creating_a_session_sweeps_expired_ones() {
        let mut stale = settings("testing");
        stale.permanent_session_lifetime = chrono::Duration::seconds(-1);
        let store = SessionStore::new();
        for _ in 0..25 {
            store.create(&stale).unwrap();
        }
        assert_eq!(store.len(), 25);

        store.create(&settings("testing")).unwrap();
        assert_eq!(store.len(), 1);

        for _ in 0..5 {
            store.create(&stale).unwrap();
        }
        store.login(None, "user-1", &settings("testing")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn full_table_evicts_anonymous_sessions_first() {
        let s = settings("testing");
        let store = SessionStore::with_capacity(3);
        let mut short = settings("testing");
        short.permanent_session_lifetime = chrono::Duration::hours(1);
        let authed = store.login(None, "user-1", &short).unwrap();
        let first_anon = store.create(&short).unwrap();
        store.create(&s).unwrap();
        for _ in 0..10 {
            store.create(&s).unwrap();
        }
        assert_eq!(store.len(), 3);
        assert!(store.get(&authed.token).unwrap().is_some());
        assert!(store.get(&first_anon.token).unwrap().is_none());
    }

    #[test]
    fn unauthorized_points_at_login_view() {
        let err = LoginManager::default().unauthorized();
        match err {
            AppError::Unauthorized { message, details, .. } => {
                assert_eq!(message, "Please log in to access this page.");
                let details = details.unwrap();
                assert_eq!(details["login_url"], "/auth/login");
                assert_eq!(details["category"], "info");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
