use crate::handlers::prediction::{create_request, horizons, list_requests, quota};
use crate::routes::Blueprint;
use axum::{routing::get, Router};

pub fn prediction_blueprint() -> Blueprint {
    let router = Router::new()
        .route("/horizons", get(horizons))
        .route("/quota", get(quota))
        .route("/requests", get(list_requests).post(create_request));
    Blueprint::new("prediction", "/prediction", router)
}
