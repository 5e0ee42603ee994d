use crate::handlers::auth::{csrf_token, login, login_view, logout, me, register};
use crate::routes::Blueprint;
use axum::{
    routing::{get, post},
    Router,
};

pub fn auth_blueprint() -> Blueprint {
    let router = Router::new()
        .route("/csrf", get(csrf_token))
        .route("/login", get(login_view).post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/me", get(me));
    Blueprint::new("auth", "/auth", router)
}
