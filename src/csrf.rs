//! CSRF protection: state-changing requests must echo the session's CSRF token.

use crate::error::AppError;
use crate::session::{token_from_headers, CSRF_HEADER};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

pub async fn csrf_protect(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.settings.csrf_enabled || is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }
    let session = match token_from_headers(request.headers()) {
        Some(token) => state.sessions.get(&token)?,
        None => None,
    };
    let presented = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    match (session, presented) {
        (Some(session), Some(token)) if tokens_match(&session.csrf_token, token) => {}
        (None, _) => return Err(AppError::Forbidden("CSRF session token is missing".into())),
        _ => return Err(AppError::Forbidden("CSRF token is missing or invalid".into())),
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_methods_skip_the_check() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }
}
