//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown configuration profile: {0}")]
    UnknownProfile(String),
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("routing group already registered: {0}")]
    DuplicateBlueprint(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    Unauthorized {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("daily prediction limit of {limit} reached")]
    QuotaExceeded { limit: u32 },
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Envelope for the global "internal error" response. Carries no detail about the failure.
pub fn internal_error_response() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error".into(),
        None,
    )
}

/// Envelope for the global "not found" response.
pub fn not_found_response() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", "Not found".into(), None)
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: String,
    details: Option<serde_json::Value>,
) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message,
            details,
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                internal_error_response()
            }
            AppError::NotFound(message) => error_response(status, "not_found", message, None),
            AppError::Unauthorized {
                code,
                message,
                details,
            } => error_response(status, code, message, details),
            AppError::QuotaExceeded { limit } => error_response(
                status,
                "quota_exceeded",
                self.to_string(),
                Some(serde_json::json!({ "limit": limit })),
            ),
            AppError::Validation(message) => {
                error_response(status, "validation_error", message, None)
            }
            AppError::Conflict(message) => error_response(status, "conflict", message, None),
            AppError::Forbidden(message) => error_response(status, "forbidden", message, None),
            AppError::BadRequest(message) => error_response(status, "bad_request", message, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_variants_map_to_500() {
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Config(ConfigError::UnknownProfile("staging".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_variants_keep_their_status() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::QuotaExceeded { limit: 50 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Unauthorized {
                code: "unauthorized",
                message: "no".into(),
                details: None,
            }
            .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("csrf".into()).status(), StatusCode::FORBIDDEN);
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_messages_carry_no_category_prefix() {
        let body = body_of(AppError::Forbidden("CSRF token is missing or invalid".into())).await;
        assert_eq!(body["error"]["code"], "forbidden");
        assert_eq!(body["error"]["message"], "CSRF token is missing or invalid");

        let body = body_of(AppError::Validation("amount must be positive".into())).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["message"], "amount must be positive");

        let body = body_of(AppError::Conflict("username already taken: bob".into())).await;
        assert_eq!(body["error"]["message"], "username already taken: bob");

        let body = body_of(AppError::BadRequest("body must be JSON".into())).await;
        assert_eq!(body["error"]["code"], "bad_request");
        assert_eq!(body["error"]["message"], "body must be JSON");
    }

    #[tokio::test]
    async fn internal_detail_is_not_exposed() {
        let body = body_of(AppError::Internal("pool: postgres://u:p@db".into())).await;
        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[test]
    fn unknown_profile_message_names_the_profile() {
        let e = ConfigError::UnknownProfile("staging".into());
        assert_eq!(e.to_string(), "unknown configuration profile: staging");
    }
}
