//! Main site pages, rendered as JSON documents carrying the template globals.

use crate::extractors::MaybeUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /
pub async fn index(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Json<Value> {
    Json(state.globals.render(json!({
        "page": "index",
        "authenticated": user.is_some(),
        "username": user.map(|u| u.username),
    })))
}

/// GET /about
pub async fn about(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.settings;
    Json(state.globals.render(json!({
        "page": "about",
        "prediction_days": settings.prediction_days,
        "max_predictions_per_day": settings.max_predictions_per_day,
        "data_source": settings.coingecko_base_url,
    })))
}
