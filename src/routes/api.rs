use crate::handlers::api::{convert_currency, health, public_config, ready, version};
use crate::routes::Blueprint;
use axum::{routing::get, Router};

pub fn api_blueprint() -> Blueprint {
    let router = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/config", get(public_config))
        .route("/convert", get(convert_currency));
    Blueprint::new("api", "/api", router)
}
