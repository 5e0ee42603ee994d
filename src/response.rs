//! Standard response envelope helpers.

use crate::error::AppError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    success_one_with(StatusCode::CREATED, data)
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    success_one_with(StatusCode::OK, data)
}

pub fn success_one_with<T: Serialize>(
    status: StatusCode,
    data: T,
) -> (StatusCode, Json<SuccessOne<T>>) {
    (status, Json(SuccessOne { data, meta: None }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

/// Attach a `Set-Cookie` header to a response.
pub fn with_cookie(response: impl IntoResponse, cookie: &str) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("set-cookie header: {}", e)))?;
    let mut response = response.into_response();
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}
