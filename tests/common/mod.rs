#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use cryptoscore::{App, ConfigRegistry, Persistence};
use serde_json::Value;
use tower::ServiceExt;

pub fn memory_app(profile: &str) -> App {
    let settings = ConfigRegistry::standard().select(profile, |_| None).unwrap();
    App::with_persistence(settings, Persistence::in_memory()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response: Response<Body> = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cookie, body)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, csrf: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    if let Some(t) = csrf {
        builder = builder.header("X-CSRF-Token", t);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `session=<token>` from a `Set-Cookie` value.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

/// Session cookie and CSRF token for a freshly registered user.
pub async fn register(router: &Router, username: &str) -> (String, String) {
    let (status, set_cookie, body) = send(router, get("/auth/csrf", None)).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie_pair(&set_cookie.unwrap());
    let csrf = body["data"]["csrf_token"].as_str().unwrap().to_string();

    let (status, set_cookie, body) = send(
        router,
        post_json(
            "/auth/register",
            Some(&cookie),
            Some(&csrf),
            serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "correct horse battery",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let cookie = cookie_pair(&set_cookie.unwrap());
    let csrf = body["data"]["csrf_token"].as_str().unwrap().to_string();
    (cookie, csrf)
}
