use crate::handlers::site::{about, index};
use crate::routes::Blueprint;
use axum::{routing::get, Router};

pub fn main_blueprint() -> Blueprint {
    let router = Router::new()
        .route("/", get(index))
        .route("/about", get(about));
    Blueprint::new("main", "/", router)
}
