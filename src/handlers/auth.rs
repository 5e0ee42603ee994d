//! Authentication handlers: CSRF bootstrap, register, login, logout, current user.

use crate::error::AppError;
use crate::extractors::{CurrentSession, CurrentUser};
use crate::models::{NewUser, User};
use crate::password::{hash_password, verify_password};
use crate::response::{success_one, success_one_ok, with_cookie};
use crate::service::{LoginBody, RegisterBody, RequestValidator};
use crate::session::{clear_session_cookie, session_cookie, Session};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CsrfBody {
    pub csrf_token: String,
}

#[derive(Serialize)]
pub struct SignedIn {
    pub user: User,
    pub csrf_token: String,
}

/// GET /auth/csrf — return the session's CSRF token, starting an anonymous session if needed.
pub async fn csrf_token(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Response, AppError> {
    if let Some(session) = identity.session {
        return Ok(success_one_ok(CsrfBody {
            csrf_token: session.csrf_token,
        })
        .into_response());
    }
    let session = state.sessions.create(&state.settings)?;
    let cookie = session_cookie(&state.settings, &session);
    with_cookie(
        success_one_ok(CsrfBody {
            csrf_token: session.csrf_token,
        }),
        &cookie,
    )
}

/// GET /auth/login — the login view: what to send, where, and whether already signed in.
pub async fn login_view(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Json<serde_json::Value> {
    let manager = &state.login_manager;
    Json(state.globals.render(serde_json::json!({
        "page": "login",
        "login_url": manager.login_view,
        "message": manager.login_message,
        "category": manager.login_message_category,
        "authenticated": identity.user.is_some(),
    })))
}

fn signed_in(state: &AppState, user: User, session: Session) -> (SignedIn, String) {
    let cookie = session_cookie(&state.settings, &session);
    (
        SignedIn {
            user,
            csrf_token: session.csrf_token,
        },
        cookie,
    )
}

/// POST /auth/register — create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Json(body): Json<RegisterBody>,
) -> Result<Response, AppError> {
    RequestValidator::registration(&body)?;
    let password_hash = hash_password(&body.password)?;
    let user = state
        .users
        .create(NewUser {
            username: body.username,
            email: body.email.trim().to_string(),
            password_hash,
        })
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    let previous = identity.session.as_ref().map(|s| s.token.as_str());
    let session = state.sessions.login(previous, &user.id, &state.settings)?;
    let (body, cookie) = signed_in(&state, user, session);
    with_cookie(success_one(body), &cookie)
}

/// POST /auth/login — verify credentials and bind the user to a fresh session.
pub async fn login(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Json(body): Json<LoginBody>,
) -> Result<Response, AppError> {
    let user = state
        .users
        .get_by_username(&body.username)
        .await?
        .filter(|u| verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| AppError::Unauthorized {
            code: "invalid_credentials",
            message: "invalid username or password".into(),
            details: None,
        })?;
    let previous = identity.session.as_ref().map(|s| s.token.as_str());
    let session = state.sessions.login(previous, &user.id, &state.settings)?;
    tracing::info!(user_id = %user.id, "user logged in");
    let (body, cookie) = signed_in(&state, user, session);
    with_cookie(success_one_ok(body), &cookie)
}

/// POST /auth/logout — end the session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Response, AppError> {
    if let Some(session) = identity.session {
        state.sessions.remove(&session.token)?;
    }
    with_cookie(
        success_one_ok(serde_json::json!({ "logged_out": true })),
        &clear_session_cookie(&state.settings),
    )
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    success_one_ok(user)
}
