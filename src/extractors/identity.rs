//! Identity resolution: session cookie -> session -> user record, once per request.

use crate::error::AppError;
use crate::models::User;
use crate::session::{token_from_headers, Session};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Map a persisted user id to its record. `None` when no such user exists.
pub async fn load_user(state: &AppState, user_id: &str) -> Result<Option<User>, AppError> {
    state.users.get_by_id(user_id).await
}

/// Identity resolved for the current request; cached in request extensions.
#[derive(Clone, Debug, Default)]
pub struct ResolvedIdentity {
    pub session: Option<Session>,
    pub user: Option<User>,
}

pub async fn resolve_identity(
    parts: &mut Parts,
    state: &AppState,
) -> Result<ResolvedIdentity, AppError> {
    if let Some(cached) = parts.extensions.get::<ResolvedIdentity>() {
        return Ok(cached.clone());
    }
    let session = match token_from_headers(&parts.headers) {
        Some(token) => state.sessions.get(&token)?,
        None => None,
    };
    let user = match session.as_ref().and_then(|s| s.user_id.as_deref()) {
        Some(user_id) => {
            let user = load_user(state, user_id).await?;
            if user.is_none() {
                tracing::debug!(user_id = %user_id, "session refers to a missing user");
            }
            user
        }
        None => None,
    };
    let resolved = ResolvedIdentity { session, user };
    parts.extensions.insert(resolved.clone());
    Ok(resolved)
}

/// Authenticated user; rejects with the login-view 401 otherwise.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let resolved = resolve_identity(parts, state).await?;
        resolved
            .user
            .map(CurrentUser)
            .ok_or_else(|| state.login_manager.unauthorized())
    }
}

#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_identity(parts, state).await?.user))
    }
}

/// Live session (anonymous or authenticated) and its user, if any.
#[derive(Clone, Debug)]
pub struct CurrentSession(pub ResolvedIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(resolve_identity(parts, state).await?))
    }
}
